//! Money text helpers — lenient parsing and display formatting.
//!
//! DESIGN
//! ======
//! Amounts live in the ledger as user-editable text. Arithmetic happens by
//! parsing on demand and writing the result back as text, so parsing must be
//! total: anything that is not a number reads as zero.

use serde::{Deserialize, Deserializer};

/// Parse free-text money input. Unparseable input yields `0.0`.
///
/// Leading whitespace is skipped and the longest numeric prefix is used, so
/// `"12abc"` reads as `12.0` and `"1e2"` as `100.0`. Accepts an optional sign,
/// a decimal point, and an exponent. Non-finite results read as zero.
#[must_use]
pub fn parse_amount(text: &str) -> f64 {
    let prefix = numeric_prefix(text.trim_start());
    if prefix.is_empty() {
        return 0.0;
    }
    match prefix.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Format an amount as shortest round-trip decimal text.
///
/// Whole numbers print without a fractional part (`13.0` -> `"13"`), and
/// negative zero or non-finite values print as `"0"`.
#[must_use]
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0".to_owned();
    }
    format!("{value}")
}

/// Two-decimal display used by totals.
#[must_use]
pub fn format_money(value: f64) -> String {
    if value.is_finite() && value.abs() < 0.005 {
        return "0.00".to_owned();
    }
    format!("{value:.2}")
}

pub(crate) fn zero_amount() -> String {
    "0".to_owned()
}

/// Accept amount text stored either as a JSON string or a JSON number.
/// `null` reads as `"0"`.
pub(crate) fn deserialize_amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(value) => format_amount(value),
        Raw::Null(()) => zero_amount(),
    })
}

/// Longest prefix of `s` that forms a decimal literal, or `""` when there are
/// no mantissa digits.
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        let frac_digits = frac_end - frac_start;
        if digits + frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }

    if digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    &s[..end]
}

#[cfg(test)]
#[path = "money_test.rs"]
mod tests;
