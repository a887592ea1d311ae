//! Money formatting and parsing.
//!
//! Amounts are `Decimal` throughout, and grouping is done on the digit
//! string, so values in the trillions keep every digit.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use super::metrics::AMOUNTS_CLAMPED_TOTAL;

/// Largest magnitude accepted for display (10^14).
pub fn amount_ceiling() -> Decimal {
    Decimal::from(100_000_000_000_000_i64)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedAmount {
    pub text: String,
    /// The input exceeded the ceiling and was clamped to it.
    pub clamped: bool,
}

impl fmt::Display for FormattedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Two decimals, half away from zero, comma-grouped thousands.
pub fn format(amount: Decimal) -> FormattedAmount {
    let ceiling = amount_ceiling();
    let (value, clamped) = if amount.abs() > ceiling {
        warn!(amount = %amount, ceiling = %ceiling, "Amount exceeds display ceiling, clamping");
        AMOUNTS_CLAMPED_TOTAL.inc();
        let clamped = if amount.is_sign_negative() { -ceiling } else { ceiling };
        (clamped, true)
    } else {
        (amount, false)
    };

    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().to_string();
    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer.to_string(), fraction.to_string()),
        None => (digits, String::new()),
    };

    let mut text = String::with_capacity(integer.len() + integer.len() / 3 + 4);
    if negative {
        text.push('-');
    }
    text.push_str(&group_thousands(&integer));
    text.push('.');
    text.push_str(&format!("{:0<2}", fraction));

    FormattedAmount { text, clamped }
}

/// Format a float amount. Finite values beyond the ceiling clamp like
/// [`format`]; NaN and infinities format as zero.
pub fn format_f64(amount: f64) -> FormattedAmount {
    if !amount.is_finite() {
        return format(Decimal::ZERO);
    }
    if amount.abs() > 1e14 {
        // Large floats may not fit a Decimal at all.
        let over = amount_ceiling() + Decimal::ONE;
        return format(if amount < 0.0 { -over } else { over });
    }
    format(Decimal::from_f64(amount).unwrap_or(Decimal::ZERO))
}

/// Parse a formatted or hand-typed amount. Keeps digits, a leading minus
/// and the decimal point; the last `.` is the decimal point. Anything
/// unparseable is zero.
pub fn parse(input: &str) -> Decimal {
    let trimmed = input.trim();
    let negative = trimmed.starts_with('-');
    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Decimal::ZERO;
    }

    let (integer, fraction) = match cleaned.rfind('.') {
        Some(index) => (cleaned[..index].replace('.', ""), cleaned[index + 1..].to_string()),
        None => (cleaned, String::new()),
    };
    let integer = if integer.is_empty() { "0".to_string() } else { integer };
    let fraction = format!("{:0<2}", fraction);

    let sign = if negative { "-" } else { "" };
    Decimal::from_str(&format!("{}{}.{}", sign, integer, fraction)).unwrap_or(Decimal::ZERO)
}

/// [`parse`] for callers that need a float.
pub fn parse_f64(input: &str) -> f64 {
    parse(input).to_f64().unwrap_or(0.0)
}

/// Normalise what a user typed into an amount field.
pub fn format_input(raw: &str) -> FormattedAmount {
    format(parse(raw))
}

fn group_thousands(integer: &str) -> String {
    let len = integer.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
