//! Point-in-time parsing and token-pattern rendering.
//!
//! Supported tokens: `YYYY YY MMMM MM M DD D HH H hh h mm m ss s`.
//! Text inside `[...]` is copied literally. When the source cannot be
//! parsed the pattern itself is shown with brackets removed, so the user
//! sees a hint of the expected layout instead of an error.

use super::DisplayLocale;
use crate::value::strict_number;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde_json::{Map, Value};

/// Epoch values at or above this magnitude are milliseconds
const MILLIS_THRESHOLD: f64 = 1e12;

const TOKENS: [&str; 15] = [
    "YYYY", "YY", "MMMM", "MM", "M", "DD", "D", "HH", "H", "hh", "h", "mm", "m", "ss", "s",
];

/// Render `raw` with `pattern`, or the bracket-free pattern when `raw` is not a date.
pub fn format_datetime(
    raw: &Value,
    attributes: Option<&Map<String, Value>>,
    pattern: &str,
    locale: &DisplayLocale,
) -> String {
    match parse_point_in_time(raw, attributes, locale.time_zone) {
        Some(dt) => render_pattern(pattern, &dt, &locale.language),
        None => render_hint(pattern),
    }
}

/// Parse a raw entity value as a point in time in `tz`.
///
/// Understands epoch seconds/milliseconds, ISO-like strings with `T` or a
/// space between date and time, and input_datetime states described by the
/// `has_date`/`has_time` attributes.
pub fn parse_point_in_time(
    raw: &Value,
    attributes: Option<&Map<String, Value>>,
    tz: Tz,
) -> Option<DateTime<Tz>> {
    if let Some(attrs) = attributes {
        if let Some(dt) = parse_input_datetime(raw, attrs, tz) {
            return Some(dt);
        }
    }

    if let Some(epoch) = strict_number(raw) {
        return from_epoch(epoch, tz);
    }

    match raw {
        Value::String(s) => parse_iso_like(s.trim(), tz),
        _ => None,
    }
}

fn from_epoch(epoch: f64, tz: Tz) -> Option<DateTime<Tz>> {
    let millis = if epoch.abs() >= MILLIS_THRESHOLD {
        epoch
    } else {
        epoch * 1000.0
    };
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis.round() as i64).map(|dt| dt.with_timezone(&tz))
}

fn parse_input_datetime(raw: &Value, attrs: &Map<String, Value>, tz: Tz) -> Option<DateTime<Tz>> {
    let has_date = attrs.get("has_date").and_then(Value::as_bool);
    let has_time = attrs.get("has_time").and_then(Value::as_bool);
    if has_date.is_none() && has_time.is_none() {
        return None;
    }
    let state = raw.as_str()?.trim();

    let naive = match (has_date.unwrap_or(false), has_time.unwrap_or(false)) {
        (true, true) => parse_naive_datetime(&state.replacen(' ', "T", 1))?,
        (true, false) => NaiveDate::parse_from_str(state, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?,
        (false, true) => {
            let time = parse_naive_time(state)?;
            NaiveDate::from_ymd_opt(1970, 1, 1)?.and_time(time)
        }
        (false, false) => return None,
    };
    localize(naive, tz)
}

fn parse_iso_like(s: &str, tz: Tz) -> Option<DateTime<Tz>> {
    if s.is_empty() {
        return None;
    }
    let normalized = normalize_separator(s);

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&tz));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt.with_timezone(&tz));
        }
    }
    if let Some(naive) = parse_naive_datetime(&normalized) {
        return localize(naive, tz);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return localize(date.and_hms_opt(0, 0, 0)?, tz);
    }
    None
}

/// Replace the first space between a date and a time with `T`
fn normalize_separator(s: &str) -> String {
    match s.find(' ') {
        Some(idx) if idx >= 8 && s[..idx].contains('-') => {
            let mut out = String::with_capacity(s.len());
            out.push_str(&s[..idx]);
            out.push('T');
            out.push_str(s[idx + 1..].trim_start());
            out
        }
        _ => s.to_string(),
    }
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn parse_naive_time(s: &str) -> Option<NaiveTime> {
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest()
}

/// Substitute date tokens in `pattern`.
pub fn render_pattern(pattern: &str, dt: &DateTime<Tz>, language: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;

    while let Some(c) = rest.chars().next() {
        if c == '[' {
            let (literal, remaining) = take_literal(&rest[1..]);
            out.push_str(literal);
            rest = remaining;
            continue;
        }
        match TOKENS.iter().find(|token| rest.starts_with(*token)) {
            Some(token) => {
                out.push_str(&render_token(token, dt, language));
                rest = &rest[token.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

/// The pattern with `[...]` escapes unwrapped and no substitution
pub fn render_hint(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(idx) = rest.find('[') {
        out.push_str(&rest[..idx]);
        let (literal, remaining) = take_literal(&rest[idx + 1..]);
        out.push_str(literal);
        rest = remaining;
    }
    out.push_str(rest);
    out
}

/// Split at the closing `]`; an unterminated escape runs to the end
fn take_literal(s: &str) -> (&str, &str) {
    match s.find(']') {
        Some(end) => (&s[..end], &s[end + 1..]),
        None => (s, ""),
    }
}

fn render_token(token: &str, dt: &DateTime<Tz>, language: &str) -> String {
    let hour12 = match dt.hour() % 12 {
        0 => 12,
        h => h,
    };
    match token {
        "YYYY" => format!("{:04}", dt.year()),
        "YY" => format!("{:02}", dt.year().rem_euclid(100)),
        "MMMM" => month_name(dt, language),
        "MM" => format!("{:02}", dt.month()),
        "M" => dt.month().to_string(),
        "DD" => format!("{:02}", dt.day()),
        "D" => dt.day().to_string(),
        "HH" => format!("{:02}", dt.hour()),
        "H" => dt.hour().to_string(),
        "hh" => format!("{:02}", hour12),
        "h" => hour12.to_string(),
        "mm" => format!("{:02}", dt.minute()),
        "m" => dt.minute().to_string(),
        "ss" => format!("{:02}", dt.second()),
        "s" => dt.second().to_string(),
        _ => token.to_string(),
    }
}

/// Full month name from chrono's locale tables
fn month_name(dt: &DateTime<Tz>, language: &str) -> String {
    dt.format_localized("%B", chrono_locale(language)).to_string()
}

/// Map a BCP 47 tag onto a chrono locale, falling back to en_US
fn chrono_locale(tag: &str) -> chrono::Locale {
    let mut parts = tag.split(['-', '_']);
    let lang = parts.next().unwrap_or("").to_lowercase();
    let region = parts.next().map(str::to_uppercase);

    let mut candidates = Vec::with_capacity(2);
    if let Some(region) = region {
        candidates.push(format!("{}_{}", lang, region));
    }
    candidates.push(format!("{}_{}", lang, lang.to_uppercase()));

    candidates
        .iter()
        .find_map(|name| chrono::Locale::try_from(name.as_str()).ok())
        .unwrap_or(chrono::Locale::en_US)
}
