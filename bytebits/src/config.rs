use serde::{Deserialize, Serialize};

use crate::engine::ValueSyncEngine;
use crate::error::ConfigError;
use crate::render::DisplayMode;
use crate::value;

/// Row count used when a config does not name one.
pub const DEFAULT_ROWS: usize = 4;

/// Widget setup matching the TOML format:
///
/// ```toml
/// rows = 2
/// values = [5, 200]
/// show_bits = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WidgetConfig {
    #[serde(default = "default_rows")]
    pub rows: usize,
    /// Initial register values, coerced like any other input.
    #[serde(default)]
    pub values: Vec<i64>,
    #[serde(default)]
    pub show_bits: bool,
}

fn default_rows() -> usize {
    DEFAULT_ROWS
}

impl Default for WidgetConfig {
    fn default() -> Self {
        WidgetConfig {
            rows: DEFAULT_ROWS,
            values: Vec::new(),
            show_bits: false,
        }
    }
}

impl WidgetConfig {
    /// Parse and validate a TOML config string.
    pub fn from_toml(toml_str: &str) -> Result<WidgetConfig, ConfigError> {
        let config: WidgetConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 {
            return Err(ConfigError::NoRows);
        }
        if self.values.len() > self.rows {
            return Err(ConfigError::TooManyValues {
                values: self.values.len(),
                rows: self.rows,
            });
        }
        Ok(())
    }

    pub fn display_mode(&self) -> DisplayMode {
        DisplayMode::from_show_bits(self.show_bits)
    }

    /// Build the engine this config describes.
    pub fn into_engine(self) -> Result<ValueSyncEngine, ConfigError> {
        self.validate()?;
        let values: Vec<u8> = self.values.iter().map(|&v| value::clamp(v)).collect();
        Ok(ValueSyncEngine::with_values(self.rows, &values).with_display_mode(self.display_mode()))
    }
}
