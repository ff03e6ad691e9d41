//! File-based configuration.
//!
//! A [`Config`] bundles the extraction and mapping options so a whole run can
//! be described in one JSON file. Every field is optional; missing fields
//! keep their defaults.
//!
//! ```json
//! {
//!   "extract": { "custom_headers": ["Document Info"], "inline_markup": true },
//!   "mapping": { "auto_assign_threshold": 0.85 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extract::ExtractOptions;
use crate::mapping::MappingOptions;

/// Options for both extraction and mapping runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Section extraction options
    pub extract: ExtractOptions,

    /// Header mapping options
    pub mapping: MappingOptions,
}

impl Config {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check option ranges and the canonical schema.
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("extract.custom_header_threshold", self.extract.custom_header_threshold),
            ("mapping.auto_assign_threshold", self.mapping.auto_assign_threshold),
            (
                "mapping.mapping_similarity_threshold",
                self.mapping.mapping_similarity_threshold,
            ),
            ("mapping.trim_threshold_ratio", self.mapping.trim_threshold_ratio),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        if self.mapping.trim_window == 0 {
            return Err(Error::Config("mapping.trim_window must be at least 1".into()));
        }
        self.mapping.schema.validate()
    }
}
