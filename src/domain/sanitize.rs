//! Cell sanitization and parsing shared by every binder.
//!
//! Spreadsheet exports carry currency symbols, thousands separators, percent
//! signs and stray whitespace. Numeric cells are reduced to the characters a
//! decimal literal needs before parsing; names are reduced to alphanumerics so
//! that the same organization or account joins across reports even when the
//! punctuation differs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

/// Strips every non-alphanumeric character.
pub fn sanitize_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Keeps digits, `.`, `E`, `e` and `+`. An empty result becomes `"0"`.
pub fn sanitize_float_string(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | 'E' | 'e' | '+'))
        .collect();
    if sanitized.is_empty() {
        "0".to_string()
    } else {
        sanitized
    }
}

/// Keeps digits only. An empty result becomes `"0"`.
pub fn sanitize_integer_string(value: &str) -> String {
    let sanitized: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if sanitized.is_empty() {
        "0".to_string()
    } else {
        sanitized
    }
}

/// Parses a sanitized numeric cell. Unparseable input yields zero.
pub fn parse_decimal(value: &str) -> Decimal {
    let sanitized = sanitize_float_string(value);
    let parsed = if sanitized.contains(['e', 'E']) {
        Decimal::from_scientific(&sanitized)
    } else {
        Decimal::from_str(&sanitized)
    };

    match parsed {
        Ok(d) => d.normalize(),
        Err(e) => {
            trace!("Cell '{}' is not a decimal ({}), using 0", value, e);
            Decimal::ZERO
        }
    }
}

/// Parses a date cell into a date-only value.
///
/// Accepts `YYYY-MM-DD` (unpadded month/day allowed) optionally followed by a
/// time after a space or `T`, and US `MM/DD/YYYY`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let mut value = value.trim();
    if value.contains(':') {
        value = value.split(' ').next().unwrap_or(value);
    }
    if value.contains('T') {
        value = value.split('T').next().unwrap_or(value);
    }

    let (year, month, day) = if value.contains('/') {
        let mut parts = value.split('/');
        let month = parts.next()?;
        let day = parts.next()?;
        let year = parts.next()?;
        (year, month, day)
    } else {
        let mut parts = value.split('-');
        let year = parts.next()?;
        let month = parts.next()?;
        let day = parts.next()?;
        (year, month, day)
    };

    NaiveDate::from_ymd_opt(
        year.trim().parse().ok()?,
        month.trim().parse().ok()?,
        day.trim().parse().ok()?,
    )
}
