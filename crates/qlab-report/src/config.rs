//! Report configuration.
//!
//! Supports loading configuration from:
//! 1. A YAML file
//! 2. Environment variables (with `QLAB_` prefix)
//! 3. `.env` files
//!
//! Precedence (highest to lowest): environment, file, defaults.
//!
//! ```yaml
//! decimals: 4
//! color: true
//! show_bars: true
//! export: true
//! output_dir: plots
//! chart_width: 1200
//! chart_height: 800
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fewest decimals a probability may be printed with.
pub const MIN_DECIMALS: usize = 4;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },

    /// The file is not valid YAML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// How reports are printed and exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Decimals shown for probabilities.
    pub decimals: usize,
    /// Colour the terminal output.
    pub color: bool,
    /// Draw a proportional bar after each line.
    pub show_bars: bool,
    /// Export charts after printing.
    pub export: bool,
    /// Directory charts are written to.
    pub output_dir: PathBuf,
    /// Chart width in pixels.
    pub chart_width: u32,
    /// Chart height in pixels.
    pub chart_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            decimals: MIN_DECIMALS,
            color: true,
            show_bars: true,
            export: true,
            output_dir: PathBuf::from("."),
            chart_width: 1200,
            chart_height: 800,
        }
    }
}

impl ReportConfig {
    /// Plain configuration for tests and pipes: no colour, no bars, no export.
    pub fn plain() -> Self {
        Self {
            color: false,
            show_bars: false,
            export: false,
            ..Self::default()
        }
    }

    /// Load from a YAML file and validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config: ReportConfig =
            serde_yaml_ng::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load `.env` if it exists
    /// 2. Load from file if provided, otherwise defaults
    /// 3. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let config = config.merge_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QLAB_*` overrides read through `lookup`.
    ///
    /// Only variables that are present override values; malformed numbers
    /// and booleans are reported rather than ignored.
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("QLAB_DECIMALS") {
            self.decimals = parse_number("QLAB_DECIMALS", &v)?;
        }
        if let Some(v) = lookup("QLAB_COLOR") {
            self.color = parse_flag("QLAB_COLOR", &v)?;
        }
        if let Some(v) = lookup("QLAB_SHOW_BARS") {
            self.show_bars = parse_flag("QLAB_SHOW_BARS", &v)?;
        }
        if let Some(v) = lookup("QLAB_EXPORT") {
            self.export = parse_flag("QLAB_EXPORT", &v)?;
        }
        if let Some(v) = lookup("QLAB_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("QLAB_CHART_WIDTH") {
            self.chart_width = parse_number("QLAB_CHART_WIDTH", &v)?;
        }
        if let Some(v) = lookup("QLAB_CHART_HEIGHT") {
            self.chart_height = parse_number("QLAB_CHART_HEIGHT", &v)?;
        }
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decimals < MIN_DECIMALS {
            return Err(ConfigError::Validation(format!(
                "decimals must be at least {MIN_DECIMALS}, got {}",
                self.decimals
            )));
        }
        if self.decimals > 15 {
            return Err(ConfigError::Validation(format!(
                "decimals must be at most 15, got {}",
                self.decimals
            )));
        }
        if self.chart_width < 200 || self.chart_height < 150 {
            return Err(ConfigError::Validation(format!(
                "chart size {}x{} is too small (minimum 200x150)",
                self.chart_width, self.chart_height
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("output_dir is empty".into()));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key}: '{value}' is not a number")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Validation(format!(
            "{key}: '{value}' is not a boolean"
        ))),
    }
}
