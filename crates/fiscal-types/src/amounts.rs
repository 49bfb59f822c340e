//! Two-decimal money formatting.
//!
//! Every decimal field on the wire carries exactly two fractional digits with
//! a period separator and no grouping. The security-code input depends on the
//! same formatting, so everything routes through these helpers.

use rust_decimal::Decimal;

/// Rounds to two decimal places (banker's rounding).
pub fn two_dp(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// Formats a monetary amount with exactly two fractional digits.
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", two_dp(value))
}
