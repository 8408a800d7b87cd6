//! Amount text codec
//!
//! Turns what the user types into exact raw amounts and renders raw amounts
//! back into short decimal text. Parsing is exact; formatting is for
//! display only and may drop precision.

use std::sync::OnceLock;

use cosmwasm_std::{Uint256, Uint512};
use regex::Regex;

use crate::amount::{pow10, scale_pow10, Amount};
use crate::currency::Currency;
use crate::error::ParseError;

/// What to do with fractional digits beyond the currency's precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// Refuse the text (swap inputs)
    #[default]
    Reject,
    /// Drop the extra digits
    Truncate,
}

/// Parse typed text into an amount of `currency`.
///
/// `""` (or whitespace) is `Ok(None)`: nothing entered. `"0"` is a zero
/// amount. Both `.` and `,` are accepted as the decimal separator.
pub fn parse(text: &str, currency: &Currency) -> Result<Option<Amount>, ParseError> {
    parse_with(text, currency, Precision::Reject)
}

pub fn parse_with(
    text: &str,
    currency: &Currency,
    precision: Precision,
) -> Result<Option<Amount>, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let normalized = trimmed.replace(',', ".");
    let (int_part, frac_part) = normalized
        .split_once('.')
        .unwrap_or((normalized.as_str(), ""));

    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !is_digits(int_part) || !is_digits(frac_part)
    {
        return Err(ParseError::InvalidNumber(text.to_string()));
    }

    let decimals = currency.decimals as usize;
    let frac = if frac_part.len() > decimals {
        match precision {
            Precision::Reject => {
                return Err(ParseError::TooManyDecimals {
                    text: text.to_string(),
                    decimals: currency.decimals,
                })
            }
            Precision::Truncate => &frac_part[..decimals],
        }
    } else {
        frac_part
    };

    let mut digits = String::with_capacity(int_part.len() + decimals);
    digits.push_str(int_part);
    digits.push_str(frac);
    digits.extend(std::iter::repeat('0').take(decimals - frac.len()));

    let significant = digits.trim_start_matches('0');
    let raw = if significant.is_empty() {
        Uint256::zero()
    } else {
        significant
            .parse::<Uint256>()
            .map_err(|_| ParseError::Overflow(text.to_string()))?
    };

    Ok(Some(Amount::from_raw(currency.clone(), raw)))
}

/// Whether `text` is an acceptable partial input for a field with
/// `decimals` fractional digits. Over-precision keystrokes are refused
/// rather than rounded.
pub fn accepts_keystroke(text: &str, decimals: u8) -> bool {
    if text.is_empty() {
        return true;
    }
    let Some(pattern) = keystroke_pattern() else {
        return false;
    };
    match pattern.captures(text) {
        Some(caps) => caps.get(1).map_or(0, |m| m.len()) <= decimals as usize,
        None => false,
    }
}

fn keystroke_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[0-9]*(?:[.,]([0-9]*))?$").ok())
        .as_ref()
}

/// Render an amount with at most `digits` significant digits. Currencies
/// with more decimals than 512 bits can scale are rendered exactly.
pub fn format_significant(amount: &Amount, digits: u32) -> String {
    match pow10(amount.currency().decimals as u32) {
        Some(unit) => format_significant_ratio(Uint512::from(amount.raw()), unit, digits),
        None => format_exact(amount),
    }
}

/// Full precision rendering, trailing zeros removed
pub fn format_exact(amount: &Amount) -> String {
    let decimals = amount.currency().decimals as usize;
    let raw = amount.raw().to_string();
    if decimals == 0 {
        return raw;
    }
    let padded = format!("{:0>width$}", raw, width = decimals + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

/// `numerator / denominator` with up to `digits` significant digits,
/// rounded half up. The integer part is always rendered in full and
/// trailing fractional zeros are dropped.
pub fn format_significant_ratio(numerator: Uint512, denominator: Uint512, digits: u32) -> String {
    if denominator.is_zero() {
        return "0".to_string();
    }
    let digits = digits.max(1);

    let integer = numerator / denominator;
    let mut remainder = numerator % denominator;

    let mut out: Vec<u8> = if integer.is_zero() {
        vec![0]
    } else {
        integer.to_string().bytes().map(|b| b - b'0').collect()
    };
    let mut int_len = out.len();
    let mut significant = if integer.is_zero() { 0 } else { int_len as u32 };

    while significant < digits && !remainder.is_zero() {
        let digit = next_digit(&mut remainder, denominator);
        out.push(digit);
        if significant > 0 || digit != 0 {
            significant += 1;
        }
    }

    if rounds_up(remainder, denominator) && increment(&mut out) {
        int_len += 1;
    }

    render_digits(&out, int_len)
}

/// `numerator / denominator` with exactly `places` fractional digits,
/// rounded half up
pub fn format_fixed_ratio(numerator: Uint512, denominator: Uint512, places: u32) -> String {
    if denominator.is_zero() {
        return "0".to_string();
    }
    let Some(scaled) = scale_pow10(numerator, places) else {
        return format_significant_ratio(numerator, denominator, places);
    };
    let mut quotient = scaled / denominator;
    if rounds_up(scaled % denominator, denominator) {
        quotient += Uint512::one();
    }

    let text = quotient.to_string();
    if places == 0 {
        return text;
    }
    let places = places as usize;
    let padded = format!("{:0>width$}", text, width = places + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - places);
    format!("{}.{}", int_part, frac_part)
}

/// Long division step: one more decimal digit of `remainder / denominator`.
/// Works in modular steps so `remainder * 10` never has to fit.
fn next_digit(remainder: &mut Uint512, denominator: Uint512) -> u8 {
    let step = *remainder;
    let gap = denominator - step;
    let mut acc = Uint512::zero();
    let mut digit = 0u8;
    for _ in 0..10 {
        if acc >= gap {
            acc -= gap;
            digit += 1;
        } else {
            acc += step;
        }
    }
    *remainder = acc;
    digit
}

fn rounds_up(remainder: Uint512, denominator: Uint512) -> bool {
    !remainder.is_zero() && remainder >= denominator - remainder
}

/// Add one unit in the last place. Returns true when a new leading digit
/// was created.
fn increment(digits: &mut Vec<u8>) -> bool {
    for d in digits.iter_mut().rev() {
        if *d == 9 {
            *d = 0;
        } else {
            *d += 1;
            return false;
        }
    }
    digits.insert(0, 1);
    true
}

fn render_digits(digits: &[u8], int_len: usize) -> String {
    let (int_digits, frac_digits) = digits.split_at(int_len);
    let mut text: String = int_digits.iter().map(|d| (b'0' + d) as char).collect();

    let frac_len = frac_digits
        .iter()
        .rposition(|d| *d != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    if frac_len > 0 {
        text.push('.');
        text.extend(frac_digits[..frac_len].iter().map(|d| (b'0' + d) as char));
    }
    text
}
