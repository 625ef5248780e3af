//! Threshold constants for health grading and advisory text

use serde::{Deserialize, Serialize};

/// Cut-offs used by the health grade and insight rules.
///
/// Margins and growth rates are fractions; growth thresholds apply to the
/// annualised revenue growth rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsThresholds {
    pub healthy_net_margin: f64,
    pub healthy_runway_months: f64,
    pub healthy_growth_rate: f64,

    pub critical_net_margin: f64,
    pub critical_runway_months: f64,
    pub critical_growth_rate: f64,

    /// Gross margin below this is flagged as a risk
    pub low_gross_margin: f64,
}

impl Default for MetricsThresholds {
    fn default() -> Self {
        Self {
            healthy_net_margin: 0.15,
            healthy_runway_months: 12.0,
            healthy_growth_rate: 0.10,
            critical_net_margin: 0.0,
            critical_runway_months: 6.0,
            critical_growth_rate: 0.0,
            low_gross_margin: 0.30,
        }
    }
}
