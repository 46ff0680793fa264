//! Locale-aware number formatting and linear rescaling.

use super::{DisplayLocale, NumberFormat};
use crate::config::Cell;
use icu::decimal::input::Decimal;
use icu::decimal::DecimalFormatter;
use icu::locale::Locale;
use tracing::debug;

/// Largest fraction digit count accepted from `precision`
pub const MAX_PRECISION: usize = 100;

/// Fraction digits kept when inferring precision from the value itself
pub const MAX_INFERRED_DIGITS: usize = 6;

/// Grouping and decimal separators for an explicit number format preference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separators {
    pub group: char,
    pub decimal: char,
}

/// 1,234.5
pub const COMMA_DECIMAL: Separators = Separators { group: ',', decimal: '.' };
/// 1.234,5
pub const DECIMAL_COMMA: Separators = Separators { group: '.', decimal: ',' };
/// 1 234,5 (narrow no-break space)
pub const SPACE_COMMA: Separators = Separators { group: '\u{202F}', decimal: ',' };

/// Separators for an explicit preference; `None` for language-derived
/// formats and for plain output.
pub fn separators(format: NumberFormat) -> Option<Separators> {
    match format {
        NumberFormat::CommaDecimal => Some(COMMA_DECIMAL),
        NumberFormat::DecimalComma => Some(DECIMAL_COMMA),
        NumberFormat::SpaceComma => Some(SPACE_COMMA),
        NumberFormat::None | NumberFormat::Language | NumberFormat::System => None,
    }
}

/// ICU decimal formatter for a BCP 47 language tag
fn language_formatter(language: &str) -> Option<DecimalFormatter> {
    let locale: Locale = language.trim().replace('_', "-").parse().ok()?;
    DecimalFormatter::try_new(locale.into(), Default::default())
        .map_err(|e| debug!(language = %language, error = ?e, "No decimal data for language"))
        .ok()
}

/// Apply the cell's linear rescale, if fully configured.
///
/// Active only when all four bounds are present and the input range is
/// non-empty. The input fraction is clamped to [0, 1] before interpolation.
pub fn rescale(value: f64, cell: &Cell) -> f64 {
    let (Some(in_min), Some(in_max), Some(out_min), Some(out_max)) = (
        cell.scale_in_min,
        cell.scale_in_max,
        cell.scale_out_min,
        cell.scale_out_max,
    ) else {
        return value;
    };
    if ![in_min, in_max, out_min, out_max].iter().all(|b| b.is_finite()) {
        return value;
    }
    let span = in_max - in_min;
    if span == 0.0 {
        return value;
    }
    let t = ((value - in_min) / span).clamp(0.0, 1.0);
    out_min + t * (out_max - out_min)
}

/// Fraction digits implied by the value's own decimal form (capped, trailing zeros trimmed)
pub fn infer_fraction_digits(value: f64) -> usize {
    let fixed = format!("{:.*}", MAX_INFERRED_DIGITS, value.abs());
    let trimmed = fixed.trim_end_matches('0');
    match trimmed.split_once('.') {
        Some((_, frac)) => frac.len(),
        None => 0,
    }
}

/// Format a number for display.
///
/// An explicit precision pins the fraction digits (up to [`MAX_PRECISION`]);
/// otherwise they are inferred from the value. Language-derived formats go
/// through ICU; explicit preferences use their fixed separators; `none`
/// gives the plain fixed/shortest representation.
pub fn format_number(value: f64, precision: Option<usize>, locale: &DisplayLocale) -> String {
    let precision = precision.map(|p| p.min(MAX_PRECISION));

    if locale.number_format == NumberFormat::None {
        return match precision {
            Some(p) => to_fixed(value, p),
            None => format!("{}", value),
        };
    }

    let digits = precision.unwrap_or_else(|| infer_fraction_digits(value));
    let fixed = to_fixed(value, digits);

    if let Some(seps) = separators(locale.number_format) {
        return localize_fixed(&fixed, seps);
    }

    match (language_formatter(&locale.language), fixed.parse::<Decimal>()) {
        (Some(formatter), Ok(decimal)) => formatter.format(&decimal).to_string(),
        _ => localize_fixed(&fixed, COMMA_DECIMAL),
    }
}

/// Fixed-point formatting with `.` as decimal point and no grouping.
///
/// Rounds half away from zero while the scaled value is exact; beyond that
/// the standard float formatting is used.
pub fn to_fixed(value: f64, digits: usize) -> String {
    match fixed_parts(value, digits) {
        Some((negative, int_part, frac_part)) => {
            let sign = if negative { "-" } else { "" };
            if frac_part.is_empty() {
                format!("{}{}", sign, int_part)
            } else {
                format!("{}{}.{}", sign, int_part, frac_part)
            }
        }
        None => format!("{:.*}", digits, value),
    }
}

/// Round half away from zero and split into sign, integer and fraction digits.
///
/// Returns `None` when the scaled value does not fit exactly in an integer.
fn fixed_parts(value: f64, digits: usize) -> Option<(bool, String, String)> {
    if !value.is_finite() || digits > 30 {
        return None;
    }
    let scale = 10f64.powi(digits as i32);
    let scaled = (value.abs() * scale).round();
    if !scaled.is_finite() || scaled >= 1e21 {
        return None;
    }

    let n = scaled as u128;
    let divisor = 10u128.pow(digits as u32);
    let int_part = (n / divisor).to_string();
    let frac_part = if digits == 0 {
        String::new()
    } else {
        format!("{:0width$}", n % divisor, width = digits)
    };

    Some((value < 0.0 && n != 0, int_part, frac_part))
}

/// Regroup a `to_fixed` string with the given separators
fn localize_fixed(fixed: &str, seps: Separators) -> String {
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return fixed.to_string();
    }

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 * 3);
    out.push_str(sign);
    out.push_str(&group_digits(int_part, seps.group));
    if !frac_part.is_empty() {
        out.push(seps.decimal);
        out.push_str(frac_part);
    }
    out
}

fn group_digits(int_part: &str, group: char) -> String {
    let len = int_part.len();
    if len < 4 {
        return int_part.to_string();
    }

    let mut out = String::with_capacity(len + len / 3 * 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(group);
        }
        out.push(c);
    }
    out
}
