use super::de;
use crate::actions::ActionConfig;
use crate::rules::Rule;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::path::Path;


/// Upper bound for `column_count`
pub const MAX_COLUMNS: usize = 64;

/// Card configuration as persisted by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardConfig {
    #[serde(default, deserialize_with = "de::list_or_default")]
    pub rows: Vec<RowConfig>,
    #[serde(default = "default_column_count", deserialize_with = "de::column_count")]
    pub column_count: usize,
    #[serde(default, deserialize_with = "de::list_or_default")]
    pub column_widths: Vec<String>,
    /// 1-based column numbers hidden below `narrow_breakpoint`
    #[serde(default, deserialize_with = "de::int_list")]
    pub hide_on_narrow: Vec<i64>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub narrow_breakpoint: Option<u32>,
    /// 1-based column numbers, compared in this order
    #[serde(default, deserialize_with = "de::int_list")]
    pub sort_columns: Vec<i64>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub sort_desc: bool,
    #[serde(default, deserialize_with = "de::lenient")]
    pub zebra: bool,
    #[serde(default, deserialize_with = "de::lenient")]
    pub header_from_first_row: bool,
    #[serde(default, deserialize_with = "de::lenient")]
    pub overflow_x: bool,
    #[serde(default, deserialize_with = "de::lenient")]
    pub text_size: Option<String>,
    /// CSS length or plain pixel count
    #[serde(default)]
    pub card_padding: Option<Value>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub cell_padding: Option<CellPadding>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub custom_template_enabled: bool,
    #[serde(default, deserialize_with = "de::lenient")]
    pub custom_template_html: Option<String>,
}

fn default_column_count() -> usize {
    1
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            column_count: default_column_count(),
            column_widths: Vec::new(),
            hide_on_narrow: Vec::new(),
            narrow_breakpoint: None,
            sort_columns: Vec::new(),
            sort_desc: false,
            zebra: false,
            header_from_first_row: false,
            overflow_x: false,
            text_size: None,
            card_padding: None,
            cell_padding: None,
            custom_template_enabled: false,
            custom_template_html: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellPadding {
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub top: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub right: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub bottom: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub left: Option<f64>,
}

/// One table row: either data cells or a visual divider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowConfig {
    Separator(SeparatorRow),
    Data(DataRow),
}

/// Stand-in for malformed rows: an empty data row
impl Default for RowConfig {
    fn default() -> Self {
        RowConfig::Data(DataRow::default())
    }
}

impl RowConfig {
    pub fn is_separator(&self) -> bool {
        matches!(self, RowConfig::Separator(_))
    }

    pub fn as_data(&self) -> Option<&DataRow> {
        match self {
            RowConfig::Data(row) => Some(row),
            RowConfig::Separator(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataRow {
    #[serde(default, deserialize_with = "de::list_or_default")]
    pub cells: Vec<Cell>,
    /// Render the first cell across all columns
    #[serde(default, deserialize_with = "de::lenient")]
    pub merge_columns: bool,
    /// Row-level rules; only bg, fg and visibility apply
    #[serde(default, deserialize_with = "de::list_skip_invalid")]
    pub dyn_color: Vec<Rule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparatorRow {
    #[serde(deserialize_with = "de::lenient")]
    pub separator: SeparatorStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparatorStyle {
    /// CSS border style (solid, dashed, dotted, double)
    #[serde(default = "default_separator_style")]
    pub style: String,
    #[serde(default = "default_thickness")]
    pub thickness: u32,
    #[serde(default)]
    pub color: Option<String>,
    /// CSS width, e.g. "60%"
    #[serde(default)]
    pub length: Option<String>,
    #[serde(default = "default_separator_align")]
    pub align: Align,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_margin")]
    pub margin_top: u32,
    #[serde(default = "default_margin")]
    pub margin_bottom: u32,
}

fn default_separator_style() -> String {
    "solid".to_string()
}

fn default_thickness() -> u32 {
    1
}

fn default_separator_align() -> Align {
    Align::Center
}

fn default_opacity() -> f64 {
    1.0
}

fn default_margin() -> u32 {
    4
}

impl Default for SeparatorStyle {
    fn default() -> Self {
        Self {
            style: default_separator_style(),
            thickness: default_thickness(),
            color: None,
            length: None,
            align: default_separator_align(),
            opacity: default_opacity(),
            margin_top: default_margin(),
            margin_bottom: default_margin(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_str(&self) -> &str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    #[default]
    String,
    Icon,
    Entity,
}

/// What an entity cell shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityDisplay {
    #[default]
    Value,
    Icon,
    IconValue,
}

/// One addressable grid cell. Identity is its (row, column) position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cell {
    #[serde(rename = "type", default, deserialize_with = "de::lenient")]
    pub kind: CellType,
    /// Literal text, icon id, or entity id depending on `kind`
    #[serde(default, deserialize_with = "de::string")]
    pub value: String,
    #[serde(default, deserialize_with = "de::lenient")]
    pub attribute: Option<String>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub align: Align,
    #[serde(default, deserialize_with = "de::lenient")]
    pub style: Option<CellStyle>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub precision: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub use_entity_unit: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub scale_in_min: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub scale_in_max: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub scale_out_min: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub scale_out_max: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub entity_display: EntityDisplay,
    /// Fallback icon for `entity_display: icon` when the entity has none
    #[serde(default, deserialize_with = "de::lenient")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub datetime_format: Option<String>,
    #[serde(default, deserialize_with = "de::list_skip_invalid")]
    pub dyn_color: Vec<Rule>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub tap_action: Option<ActionConfig>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub hold_action: Option<ActionConfig>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub double_tap_action: Option<ActionConfig>,
}

impl Cell {
    /// Stand-in for cells missing from short rows
    pub fn blank() -> Self {
        Self {
            align: Align::Right,
            ..Default::default()
        }
    }

    pub fn text(value: &str) -> Self {
        Self {
            value: value.to_string(),
            ..Default::default()
        }
    }

    pub fn entity(entity_id: &str) -> Self {
        Self {
            kind: CellType::Entity,
            value: entity_id.to_string(),
            ..Default::default()
        }
    }

    /// Entity id this cell reads from, if any
    pub fn entity_id(&self) -> Option<&str> {
        match self.kind {
            CellType::Entity if !self.value.trim().is_empty() => Some(self.value.trim()),
            _ => None,
        }
    }

    /// Attribute path with surrounding whitespace removed; blank → None
    pub fn attribute_path(&self) -> Option<&str> {
        self.attribute
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strike: bool,
    #[serde(default)]
    pub font_size: Option<String>,
    #[serde(default)]
    pub letter_spacing: Option<String>,
    #[serde(default)]
    pub text_transform: Option<String>,
}

/// Card configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidColumnCount(usize),
    MissingTemplate,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidColumnCount(n) => {
                write!(f, "column_count must be between 1 and {}, got {}", MAX_COLUMNS, n)
            }
            ConfigError::MissingTemplate => {
                write!(f, "custom_template_enabled requires a non-empty custom_template_html")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl CardConfig {
    /// Check the structural invariants of the card.
    ///
    /// Rows shorter or longer than `column_count` are tolerated here; the
    /// formatter pads them with blank cells.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.column_count == 0 || self.column_count > MAX_COLUMNS {
            return Err(ConfigError::InvalidColumnCount(self.column_count));
        }
        if self.custom_template_enabled
            && self
                .custom_template_html
                .as_deref()
                .map_or(true, |html| html.trim().is_empty())
        {
            return Err(ConfigError::MissingTemplate);
        }
        Ok(())
    }

    /// Cell at (row, col), or a blank right-aligned cell when the row is
    /// short, a separator, or out of range.
    pub fn cell(&self, row: usize, col: usize) -> Cow<'_, Cell> {
        self.rows
            .get(row)
            .and_then(RowConfig::as_data)
            .and_then(|data| data.cells.get(col))
            .map(Cow::Borrowed)
            .unwrap_or_else(|| Cow::Owned(Cell::blank()))
    }

    /// Configured sort columns as unique, in-range, 0-based indices
    pub fn sort_column_indices(&self) -> Vec<usize> {
        one_based_to_indices(&self.sort_columns, self.column_count)
    }

    /// Per-column hidden flags for the given viewport width
    pub fn hidden_columns(&self, viewport_width: Option<u32>) -> Vec<bool> {
        let mut hidden = vec![false; self.column_count];
        let narrow = match (viewport_width, self.narrow_breakpoint) {
            (Some(width), Some(breakpoint)) => width < breakpoint,
            _ => false,
        };
        if narrow {
            for idx in one_based_to_indices(&self.hide_on_narrow, self.column_count) {
                hidden[idx] = true;
            }
        }
        hidden
    }

    /// Load and validate a card from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read card config {}", path.display()))?;
        let config: CardConfig =
            serde_json::from_str(&json).context("Failed to deserialize card config JSON")?;
        config.validate().context("Invalid card config")?;
        Ok(config)
    }
}

fn one_based_to_indices(columns: &[i64], column_count: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = Vec::new();
    for &col in columns {
        if col < 1 || col as usize > column_count {
            continue;
        }
        let idx = col as usize - 1;
        if !indices.contains(&idx) {
            indices.push(idx);
        }
    }
    indices
}
