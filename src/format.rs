use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::DisplayConfig;

fn round_half_away(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Canonical string form of a money amount, as used in JSON and CSV output.
///
/// Rounds to `currency_decimals` when set, then strips trailing zeros.
pub fn format_amount_value(value: Decimal, currency_decimals: Option<u32>) -> String {
    let value = match currency_decimals {
        Some(dp) => round_half_away(value, dp),
        None => value,
    };
    value.normalize().to_string()
}

/// Pads or cuts the fractional part of a plain decimal string to exactly `dp`
/// digits.
fn fixed_fraction(s: &str, dp: u32) -> String {
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if dp == 0 {
        return int_part.to_string();
    }
    let frac: String = frac_part
        .chars()
        .chain(std::iter::repeat('0'))
        .take(dp as usize)
        .collect();
    format!("{int_part}.{frac}")
}

/// Inserts `,` every three integer digits.
fn with_thousands(s: &str) -> String {
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }
    if frac_part.is_empty() {
        grouped
    } else {
        format!("{grouped}.{frac_part}")
    }
}

/// Human-facing money string.
///
/// - `currency_decimals`: rounding precision (half away from zero)
/// - `currency_grouping`: thousands separators
/// - `currency_symbol`: prefix placed after any minus sign
/// - `currency_fixed_decimals`: with `currency_decimals`, always show exactly
///   that many fractional digits
pub fn format_amount_display(
    value: Decimal,
    currency_decimals: Option<u32>,
    currency_grouping: bool,
    currency_symbol: Option<&str>,
    currency_fixed_decimals: bool,
) -> String {
    let rounded = match currency_decimals {
        Some(dp) => round_half_away(value, dp),
        None => value,
    };

    let mut digits = rounded.abs().normalize().to_string();
    if let (true, Some(dp)) = (currency_fixed_decimals, currency_decimals) {
        digits = fixed_fraction(&digits, dp);
    }
    if currency_grouping {
        digits = with_thousands(&digits);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{}{digits}", currency_symbol.unwrap_or_default())
}

/// [`format_amount_display`] driven by the `[display]` config section.
pub fn format_amount(value: Decimal, display: &DisplayConfig) -> String {
    format_amount_display(
        value,
        display.currency_decimals,
        display.currency_grouping,
        display.currency_symbol.as_deref(),
        display.currency_fixed_decimals,
    )
}

/// Percentage with one decimal place and a trailing `%`, e.g. `42.9%`.
pub fn format_percentage(value: Decimal) -> String {
    let rounded = round_half_away(value, 1).normalize().to_string();
    format!("{}%", fixed_fraction(&rounded, 1))
}
