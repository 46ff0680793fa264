// Cell Formatter: cell descriptor + live state -> display text/icon

pub mod datetime;
pub mod number;


use crate::config::{Cell, CellType, EntityDisplay};
use crate::state::StateProvider;
use crate::value::{display_string, strict_number};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Text shown for unresolvable entity values
pub const NOT_AVAILABLE: &str = "n/a";

/// Number grouping preference, as offered by the host's user profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    /// Derive separators from the configured language
    #[default]
    Language,
    /// Host's system locale; treated like `Language`
    System,
    /// 1,234.5
    CommaDecimal,
    /// 1.234,5
    DecimalComma,
    /// 1 234,5
    SpaceComma,
    /// No grouping, `.` decimal point
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownNumberFormat(pub String);

impl fmt::Display for UnknownNumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown number format '{}'", self.0)
    }
}

impl std::error::Error for UnknownNumberFormat {}

impl FromStr for NumberFormat {
    type Err = UnknownNumberFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "language" => Ok(NumberFormat::Language),
            "system" => Ok(NumberFormat::System),
            "comma_decimal" => Ok(NumberFormat::CommaDecimal),
            "decimal_comma" => Ok(NumberFormat::DecimalComma),
            "space_comma" => Ok(NumberFormat::SpaceComma),
            "none" => Ok(NumberFormat::None),
            other => Err(UnknownNumberFormat(other.to_string())),
        }
    }
}

/// Locale information supplied by the host for one render pass
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayLocale {
    /// BCP 47 language tag
    pub language: String,
    pub number_format: NumberFormat,
    /// Zone date/time values are rendered in
    pub time_zone: Tz,
}

impl Default for DisplayLocale {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            number_format: NumberFormat::Language,
            time_zone: Tz::UTC,
        }
    }
}

/// Formatted output for one cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayResult {
    pub text: String,
    /// Unit suffix, empty when none applies
    pub unit: String,
    /// Icon id for icon cells and icon-style entity display
    pub icon: Option<String>,
}

impl DisplayResult {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn not_available() -> Self {
        Self::plain(NOT_AVAILABLE)
    }

    /// Text with the unit appended after a single space (when non-empty)
    pub fn full_text(&self) -> String {
        if self.unit.is_empty() {
            self.text.clone()
        } else {
            format!("{} {}", self.text, self.unit)
        }
    }
}

/// Format a cell against the live state.
///
/// Pure: identical inputs always produce identical output, and missing or
/// malformed data degrades to `"n/a"` or a fallback string.
pub fn format_cell(cell: &Cell, states: &dyn StateProvider, locale: &DisplayLocale) -> DisplayResult {
    match cell.kind {
        CellType::String => DisplayResult::plain(cell.value.clone()),
        CellType::Icon => DisplayResult {
            text: cell.value.clone(),
            unit: String::new(),
            icon: Some(cell.value.clone()).filter(|v| !v.is_empty()),
        },
        CellType::Entity => format_entity_cell(cell, states, locale),
    }
}

fn format_entity_cell(cell: &Cell, states: &dyn StateProvider, locale: &DisplayLocale) -> DisplayResult {
    let Some(entity_id) = cell.entity_id() else {
        return DisplayResult::not_available();
    };
    let attribute = cell.attribute_path();
    let entity = states.entity(entity_id);

    let raw = match states.resolve(entity_id, attribute) {
        Some(value) if !value.is_null() => value,
        _ => return DisplayResult::not_available(),
    };

    let attributes = entity.map(|e| &e.attributes);
    let text = format_raw(&raw, cell, attributes, locale);

    let unit = if attribute.is_some() || cell.use_entity_unit == Some(false) {
        non_empty(cell.unit.as_deref())
    } else {
        non_empty(
            attributes
                .and_then(|a| a.get("unit_of_measurement"))
                .and_then(Value::as_str),
        )
    };

    let icon = match cell.entity_display {
        EntityDisplay::Value => None,
        EntityDisplay::Icon | EntityDisplay::IconValue => attributes
            .and_then(|a| a.get("icon"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| cell.icon.clone())
            .filter(|i| !i.is_empty()),
    };

    DisplayResult { text, unit, icon }
}

/// Format an already-resolved raw value using the cell's formatting options.
///
/// Date patterns take priority, then numeric formatting (with rescale),
/// then plain string conversion.
pub fn format_raw(
    raw: &Value,
    cell: &Cell,
    attributes: Option<&Map<String, Value>>,
    locale: &DisplayLocale,
) -> String {
    if let Some(pattern) = cell.datetime_format.as_deref().filter(|p| !p.trim().is_empty()) {
        return datetime::format_datetime(raw, attributes, pattern, locale);
    }

    if let Some(n) = strict_number(raw) {
        let precision = cell
            .precision
            .filter(|p| *p >= 0)
            .map(|p| p as usize);
        return number::format_number(number::rescale(n, cell), precision, locale);
    }

    display_string(raw)
}

fn non_empty(unit: Option<&str>) -> String {
    unit.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}
