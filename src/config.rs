//! Engine configuration: metric thresholds and validation rules

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metrics::MetricsThresholds;
use crate::validation::ValidationRules;

/// Default path to an engine configuration file
pub const DEFAULT_CONFIG_PATH: &str = "data/engine.json";

/// Tunable thresholds for analysis; keys missing from a file keep their defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub metrics: MetricsThresholds,
    pub validation: ValidationRules,
}

impl EngineConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load from [`DEFAULT_CONFIG_PATH`], or defaults when the file is absent
    pub fn from_default_path() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_path(DEFAULT_CONFIG_PATH)
        } else {
            Ok(Self::default())
        }
    }
}
