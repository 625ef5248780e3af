//! Validation thresholds and score penalties

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// COGS above this fraction of revenue raises a warning
    pub max_cogs_ratio: f64,
    /// Net-loss periods tolerated in a row before warning
    pub max_consecutive_loss_periods: u32,
    /// Revenue at or below this needs no documented assumptions
    pub trivial_revenue: f64,
    /// Absolute cash amounts below this are treated as zero for sign checks
    pub cash_tolerance: f64,
    pub warning_penalty: u32,
    pub error_penalty: u32,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_cogs_ratio: 0.70,
            max_consecutive_loss_periods: 1,
            trivial_revenue: 1_000.0,
            cash_tolerance: 0.01,
            warning_penalty: 5,
            error_penalty: 20,
        }
    }
}
