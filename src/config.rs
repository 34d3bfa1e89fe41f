//! Season configuration, loaded from JSON

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Season configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonConfig {
    /// Number of races run concurrently
    pub num_races: u32,
    /// Laps per race
    pub total_laps: u32,
    /// Drivers on each roster (the grid keeps the first seven)
    pub driver_count: usize,
    /// Base seed for pit-stop tire selection; random when unset
    pub seed: Option<u64>,
    /// CSV file every lap table is appended to
    pub results_path: PathBuf,
    /// Log level name (`error`..`trace`)
    pub log_level: String,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            num_races: 7,
            total_laps: 50,
            driver_count: 10,
            seed: None,
            results_path: PathBuf::from("results.csv"),
            log_level: "info".to_string(),
        }
    }
}

impl SeasonConfig {
    /// Read a config file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
