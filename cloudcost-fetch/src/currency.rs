//! Table-driven currency conversion.

use std::collections::HashMap;

use cloudcost_core::{CoreError, CurrencyConverter, REPORT_CURRENCY};
use rust_decimal::Decimal;

/// Converts amounts using fixed rates expressed in the report currency.
///
/// A rate of `1.27` for `GBP` means one pound is worth 1.27 USD. USD is
/// always known.
#[derive(Debug, Clone, Default)]
pub struct StaticRateConverter {
    rates: HashMap<String, Decimal>,
}

impl StaticRateConverter {
    /// Creates a converter that only knows the report currency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a converter from a rate table. Non-positive rates are dropped.
    pub fn from_rates<I, K>(rates: I) -> Self
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: AsRef<str>,
    {
        rates
            .into_iter()
            .fold(Self::new(), |conv, (code, rate)| conv.with_rate(code.as_ref(), rate))
    }

    /// Adds or replaces one rate.
    #[must_use]
    pub fn with_rate(mut self, code: &str, rate: Decimal) -> Self {
        if rate > Decimal::ZERO {
            self.rates.insert(code.to_ascii_uppercase(), rate);
        }
        self
    }

    fn rate(&self, code: &str) -> Result<Decimal, CoreError> {
        if code.eq_ignore_ascii_case(REPORT_CURRENCY) {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(&code.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| CoreError::UnsupportedCurrency(code.to_string()))
    }
}

impl CurrencyConverter for StaticRateConverter {
    fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, CoreError> {
        if from.eq_ignore_ascii_case(to) {
            return Ok(amount);
        }
        let in_report = amount * self.rate(from)?;
        in_report
            .checked_div(self.rate(to)?)
            .ok_or_else(|| CoreError::InvalidData(format!("cannot convert {from} to {to}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_into_report_currency() {
        let conv = StaticRateConverter::from_rates([("gbp", Decimal::new(127, 2))]);
        let usd = conv.to_report_currency(Decimal::new(1000, 2), "GBP").unwrap();
        assert_eq!(usd, Decimal::new(1270, 2));
    }

    #[test]
    fn test_cross_rate() {
        let conv = StaticRateConverter::new()
            .with_rate("EUR", Decimal::new(110, 2))
            .with_rate("GBP", Decimal::new(132, 2));
        let gbp = conv.convert(Decimal::new(120, 0), "EUR", "GBP").unwrap();
        assert_eq!(gbp, Decimal::new(100, 0));
    }

    #[test]
    fn test_unknown_currency() {
        let conv = StaticRateConverter::new().with_rate("EUR", Decimal::ZERO);
        assert!(matches!(
            conv.to_report_currency(Decimal::ONE, "EUR"),
            Err(CoreError::UnsupportedCurrency(c)) if c == "EUR"
        ));
        assert_eq!(conv.to_report_currency(Decimal::TEN, "usd").unwrap(), Decimal::TEN);
    }
}
