//! Report configuration: defaults, optional JSON file, validation.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_INPUT: &str = "python project.csv";
pub const DEFAULT_ENCODING: &str = "latin1";
pub const MIN_CHART_SIDE: u32 = 200;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Settings for one report run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub input: PathBuf,
    /// WHATWG encoding label of the input file.
    pub encoding: String,
    pub output_dir: PathBuf,
    /// Entries kept in the product rankings.
    pub top_n: usize,
    pub chart_width: u32,
    pub chart_height: u32,
    pub render_charts: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            encoding: DEFAULT_ENCODING.to_string(),
            output_dir: PathBuf::from("charts"),
            top_n: 10,
            chart_width: 1200,
            chart_height: 700,
            render_charts: true,
        }
    }
}

impl ReportConfig {
    /// Read a JSON config; absent keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".into()));
        }
        if self.chart_width < MIN_CHART_SIDE || self.chart_height < MIN_CHART_SIDE {
            return Err(ConfigError::Invalid(format!(
                "chart size {}x{} is below the {MIN_CHART_SIDE}px minimum",
                self.chart_width, self.chart_height
            )));
        }
        if self.encoding.trim().is_empty() {
            return Err(ConfigError::Invalid("encoding must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ReportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.encoding, "latin1");
        assert_eq!(config.top_n, 10);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"top_n": 5, "output_dir": "out"}}"#).unwrap();

        let config = ReportConfig::from_file(file.path()).unwrap();
        assert_eq!(config.top_n, 5);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.chart_width, 1200);
        assert!(config.render_charts);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"colour": "red"}}"#).unwrap();
        assert!(matches!(
            ReportConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let zero_top = ReportConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(zero_top.validate().is_err());

        let tiny = ReportConfig {
            chart_width: 50,
            ..Default::default()
        };
        assert!(matches!(tiny.validate(), Err(ConfigError::Invalid(_))));
    }
}
