pub mod card;
mod de;

pub use card::{
    Align, CardConfig, Cell, CellPadding, CellStyle, CellType, ConfigError, DataRow,
    EntityDisplay, RowConfig, SeparatorRow, SeparatorStyle,
};

use crate::format::{DisplayLocale, NumberFormat};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::warn;

/// Complete preview/host configuration (TOML)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

/// Locale settings normally supplied by the host frontend
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// BCP 47 language tag (e.g. "en", "de-AT")
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub number_format: NumberFormat,
    /// IANA zone name used to render date/time values
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            number_format: NumberFormat::default(),
            time_zone: default_time_zone(),
        }
    }
}

impl DisplayConfig {
    /// Resolve into the locale the formatter works with.
    ///
    /// An unknown time zone falls back to UTC.
    pub fn locale(&self) -> DisplayLocale {
        let time_zone = self.time_zone.parse::<Tz>().unwrap_or_else(|_| {
            warn!(time_zone = %self.time_zone, "Unknown time zone, using UTC");
            Tz::UTC
        });
        DisplayLocale {
            language: self.language.clone(),
            number_format: self.number_format,
            time_zone,
        }
    }
}

/// Render-time view settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewConfig {
    /// Card width in px, compared against `narrow_breakpoint`
    #[serde(default)]
    pub viewport_width: Option<u32>,
}

impl AppConfig {
    /// Apply `FLEXCELLS_*` environment overrides; unparsable values are ignored.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("FLEXCELLS_LANGUAGE") {
            if !v.trim().is_empty() {
                self.display.language = v.trim().to_string();
            }
        }
        if let Some(v) = lookup("FLEXCELLS_NUMBER_FORMAT") {
            match v.parse::<NumberFormat>() {
                Ok(format) => self.display.number_format = format,
                Err(_) => warn!(value = %v, "Ignoring invalid FLEXCELLS_NUMBER_FORMAT"),
            }
        }
        if let Some(v) = lookup("FLEXCELLS_TIME_ZONE") {
            if v.parse::<Tz>().is_ok() {
                self.display.time_zone = v;
            } else {
                warn!(value = %v, "Ignoring invalid FLEXCELLS_TIME_ZONE");
            }
        }
        if let Some(v) = lookup("FLEXCELLS_VIEWPORT_WIDTH") {
            if let Ok(width) = v.parse::<u32>() {
                self.view.viewport_width = Some(width);
            }
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error + Send + Sync>> {
    let contents = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&contents)?;
    Ok(config)
}
