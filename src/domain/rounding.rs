//! Decimal rounding helpers.
//!
//! Billing rounds half away from zero. Intermediate quotients keep sixteen
//! decimal places; billed amounts are rounded to cents.

use rust_decimal::{Decimal, RoundingStrategy};

/// Scale of intermediate quotients
pub const DIVISION_SCALE: u32 = 16;

/// Rounds to `dp` decimal places, half away from zero.
pub fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to cents.
pub fn round_cents(value: Decimal) -> Decimal {
    round_dp(value, 2)
}

/// `numerator / denominator` rounded to `dp` places; zero when the
/// denominator is zero or the quotient overflows.
pub fn div_round_dp(numerator: Decimal, denominator: Decimal, dp: u32) -> Decimal {
    numerator
        .checked_div(denominator)
        .map(|q| round_dp(q, dp))
        .unwrap_or(Decimal::ZERO)
}

/// `numerator / denominator` at intermediate precision.
pub fn div_round(numerator: Decimal, denominator: Decimal) -> Decimal {
    div_round_dp(numerator, denominator, DIVISION_SCALE)
}

/// Renders with exactly two decimal places, e.g. `"20.00"`.
pub fn fixed_2dp(value: Decimal) -> String {
    format!("{:.2}", round_cents(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_cents(dec!(1.005)), dec!(1.01));
        assert_eq!(round_cents(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_cents(dec!(2.344)), dec!(2.34));
    }

    #[test]
    fn test_div_round() {
        assert_eq!(div_round(dec!(1), dec!(3)), dec!(0.3333333333333333));
        assert_eq!(div_round(dec!(2), dec!(3)), dec!(0.6666666666666667));
        assert_eq!(div_round(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(div_round_dp(dec!(50), dec!(300), 2), dec!(0.17));
    }

    #[test]
    fn test_fixed_2dp() {
        assert_eq!(fixed_2dp(dec!(20)), "20.00");
        assert_eq!(fixed_2dp(dec!(0.125)), "0.13");
        assert_eq!(fixed_2dp(dec!(1234.5)), "1234.50");
    }
}
