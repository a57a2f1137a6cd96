//! Billing date helpers shared by adapters.

use chrono::{Datelike, Months, NaiveDate};

use crate::error::ProviderError;

/// Parses a provider date or timestamp into a calendar day.
///
/// Only the first ten characters (`YYYY-MM-DD`) are read, so full ISO
/// timestamps are accepted. An empty string means the date is absent.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidResponse`] for anything else.
pub fn parse_billing_date(raw: &str) -> Result<Option<NaiveDate>, ProviderError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ProviderError::InvalidResponse(format!("invalid date `{raw}`")))
}

/// First day of the month containing `day`.
pub fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// First day of the month after the one containing `day`.
pub fn next_month_start(day: NaiveDate) -> NaiveDate {
    let start = month_start(day);
    start.checked_add_months(Months::new(1)).unwrap_or(start)
}

/// First day of the month before the one containing `day`.
pub fn previous_month_start(day: NaiveDate) -> NaiveDate {
    let start = month_start(day);
    start.checked_sub_months(Months::new(1)).unwrap_or(start)
}
