//! Trait definitions for cloudcost.
//!
//! Capabilities injected into provider adapters live here so that adapters
//! and the engine only share the core crate.

use rust_decimal::Decimal;

use crate::error::CoreError;

/// ISO code every report amount is expressed in.
pub const REPORT_CURRENCY: &str = "USD";

/// Converts monetary amounts between currencies.
///
/// Adapters that bill in a currency other than [`REPORT_CURRENCY`] must
/// convert through this capability before returning cost items.
pub trait CurrencyConverter: Send + Sync {
    /// Converts `amount` from currency `from` to currency `to`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedCurrency`] when either side has no known rate.
    fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, CoreError>;

    /// Converts `amount` from `from` into the report currency.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`CurrencyConverter::convert`].
    fn to_report_currency(&self, amount: Decimal, from: &str) -> Result<Decimal, CoreError> {
        if from.eq_ignore_ascii_case(REPORT_CURRENCY) {
            return Ok(amount);
        }
        self.convert(amount, from, REPORT_CURRENCY)
    }
}
