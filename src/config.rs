//! Configuration for the detection filter and tracking store.
//!
//! Every field has a default, so a partial JSON document is enough:
//!
//! ```json
//! { "filter": { "min_box_size": 30.0 }, "store": { "max_age_ms": 30000 } }
//! ```

use std::path::Path;

use crate::error::{Error, Result};
use crate::integration::FilterConfig;
use crate::tracker::StoreConfig;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub filter: FilterConfig,
    pub store: StoreConfig,
}

impl Config {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        let unit = [
            ("filter.min_confidence", self.filter.min_confidence),
            (
                "filter.tracked_fallback_confidence",
                self.filter.tracked_fallback_confidence,
            ),
            (
                "filter.untracked_fallback_confidence",
                self.filter.untracked_fallback_confidence,
            ),
            ("store.overlap_threshold", self.store.overlap_threshold),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if !self.filter.min_box_size.is_finite() || self.filter.min_box_size < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "filter.min_box_size must be a non-negative number, got {}",
                self.filter.min_box_size
            )));
        }
        Ok(())
    }
}
