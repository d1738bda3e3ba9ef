use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidStep { name: &'static str, value: f64 },
    #[error("{name} must lie in [0, 1], got {value}")]
    InvalidPercentile { name: &'static str, value: f64 },
    #[error("bed_or_more must be at least 1")]
    InvalidBedThreshold,
}

/// Tunables for the selection controls. Every field is optional in the file.
///
/// ```json
/// { "price_step": 25000, "price_percentile": 0.9 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorerConfig {
    /// Spacing of the price options.
    pub price_step: f64,
    /// Percentile that caps the price options (one step is added on top).
    pub price_percentile: f64,
    /// Spacing of the square footage slider.
    pub sqft_step: f64,
    /// Percentile used as the top of the square footage slider.
    pub sqft_percentile: f64,
    /// Bed count whose option reads "N or more".
    pub bed_or_more: u32,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            price_step: 50_000.0,
            price_percentile: 0.95,
            sqft_step: 50.0,
            sqft_percentile: 0.99,
            bed_or_more: 6,
        }
    }
}

impl ExplorerConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log::debug!("Loaded config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        for (name, value) in [("price_step", self.price_step), ("sqft_step", self.sqft_step)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidStep { name, value });
            }
        }
        for (name, value) in [
            ("price_percentile", self.price_percentile),
            ("sqft_percentile", self.sqft_percentile),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidPercentile { name, value });
            }
        }
        if self.bed_or_more == 0 {
            return Err(ConfigError::InvalidBedThreshold);
        }
        Ok(self)
    }
}
