//! Period model: forecast cadence, period keys and sequencing
//!
//! Every other component works in terms of a [`Frequency`] and an ordered run
//! of [`PeriodKey`]s. A key carries at most one of month/quarter; neither means
//! an annual period.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Forecast cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Frequency {
    #[default]
    Yearly,
    Quarterly,
    Monthly,
}

impl Frequency {
    /// Parse a frequency key. Anything unrecognised falls back to yearly.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" | "m" => Frequency::Monthly,
            "quarterly" | "quarter" | "q" => Frequency::Quarterly,
            "yearly" | "annual" | "annually" | "year" | "y" => Frequency::Yearly,
            other => {
                log::debug!("unrecognised frequency '{}', defaulting to yearly", other);
                Frequency::Yearly
            }
        }
    }

    /// Number of periods in one year (1, 4 or 12)
    pub fn periods_per_year(self) -> u32 {
        match self {
            Frequency::Yearly => 1,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
        }
    }

    /// Calendar months covered by one period
    pub fn months_per_period(self) -> u32 {
        12 / self.periods_per_year()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Yearly => "yearly",
            Frequency::Quarterly => "quarterly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl From<String> for Frequency {
    fn from(value: String) -> Self {
        Frequency::parse(&value)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert an annual rate to the equivalent compounding rate per period.
///
/// `(1 + annual)^(1/periods_per_year) - 1`, the identity for yearly periods.
pub fn period_rate(annual_rate: f64, periods_per_year: u32) -> f64 {
    if periods_per_year <= 1 {
        return annual_rate;
    }
    (1.0 + annual_rate).powf(1.0 / periods_per_year as f64) - 1.0
}

/// Identity of one forecast period within a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    /// Calendar month (1-12) for monthly periods
    #[serde(default)]
    pub month: Option<u32>,
    /// Quarter (1-4) for quarterly periods
    #[serde(default)]
    pub quarter: Option<u32>,
}

impl PeriodKey {
    pub fn annual(year: i32) -> Self {
        Self { year, month: None, quarter: None }
    }

    pub fn monthly(year: i32, month: u32) -> Self {
        Self { year, month: Some(month), quarter: None }
    }

    pub fn quarterly(year: i32, quarter: u32) -> Self {
        Self { year, month: None, quarter: Some(quarter) }
    }

    /// Check the key's shape: at most one of month/quarter, each in range
    pub fn validate(&self) -> Result<()> {
        let reason = match (self.month, self.quarter) {
            (Some(_), Some(_)) => "month and quarter are mutually exclusive",
            (Some(month), None) if !(1..=12).contains(&month) => "month must be between 1 and 12",
            (None, Some(quarter)) if !(1..=4).contains(&quarter) => "quarter must be between 1 and 4",
            _ => return Ok(()),
        };
        Err(EngineError::InvalidPeriod {
            period: *self,
            reason: reason.to_string(),
        })
    }

    /// Cadence implied by which sub-year field is set
    pub fn frequency(&self) -> Frequency {
        match (self.month, self.quarter) {
            (Some(_), _) => Frequency::Monthly,
            (None, Some(_)) => Frequency::Quarterly,
            (None, None) => Frequency::Yearly,
        }
    }

    /// Calendar month used for seasonality lookups.
    ///
    /// Annual periods map to January, quarters to their first month.
    pub fn calendar_month(&self) -> u32 {
        match (self.month, self.quarter) {
            (Some(month), _) => month,
            (None, Some(quarter)) => (quarter.saturating_sub(1)) * 3 + 1,
            (None, None) => 1,
        }
    }

    /// Calendar months covered by this period
    pub fn months_spanned(&self) -> u32 {
        self.frequency().months_per_period()
    }

    fn sort_key(&self) -> (i32, u32, u32) {
        (self.year, self.calendar_month(), self.months_spanned())
    }
}

impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.month.cmp(&other.month))
            .then_with(|| self.quarter.cmp(&other.quarter))
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.month, self.quarter) {
            (Some(month), _) => write!(f, "{}-{:02}", self.year, month),
            (None, Some(quarter)) => write!(f, "{}-Q{}", self.year, quarter),
            (None, None) => write!(f, "{}", self.year),
        }
    }
}

/// Build the ordered run of period keys for a projection.
///
/// `start_month` (1-12, clamped) places the first period; monthly and
/// quarterly runs wrap into following years.
pub fn build_sequence(
    frequency: Frequency,
    periods: usize,
    start_year: i32,
    start_month: u32,
) -> Vec<PeriodKey> {
    let first_month = start_month.clamp(1, 12) - 1;

    (0..periods as u32)
        .map(|i| match frequency {
            Frequency::Yearly => PeriodKey::annual(start_year + i as i32),
            Frequency::Quarterly => {
                let offset = first_month / 3 + i;
                PeriodKey::quarterly(start_year + (offset / 4) as i32, offset % 4 + 1)
            }
            Frequency::Monthly => {
                let offset = first_month + i;
                PeriodKey::monthly(start_year + (offset / 12) as i32, offset % 12 + 1)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_malformed_frequency_defaults_to_yearly() {
        assert_eq!(Frequency::parse("fortnightly"), Frequency::Yearly);
        assert_eq!(Frequency::parse(" Monthly "), Frequency::Monthly);
        assert_eq!(Frequency::parse("QUARTERLY"), Frequency::Quarterly);

        let parsed: Frequency = serde_json::from_str("\"bogus\"").unwrap();
        assert_eq!(parsed, Frequency::Yearly);
    }

    #[test]
    fn test_periods_per_year() {
        assert_eq!(Frequency::Yearly.periods_per_year(), 1);
        assert_eq!(Frequency::Quarterly.periods_per_year(), 4);
        assert_eq!(Frequency::Monthly.periods_per_year(), 12);
        assert_eq!(Frequency::Quarterly.months_per_period(), 3);
    }

    #[test]
    fn test_period_rate_compounds_to_annual() {
        assert_relative_eq!(period_rate(0.2, 1), 0.2);

        let monthly = period_rate(0.2, 12);
        assert_relative_eq!((1.0 + monthly).powi(12), 1.2, epsilon = 1e-12);

        let quarterly = period_rate(0.2, 4);
        assert_relative_eq!((1.0 + quarterly).powi(4), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn test_monthly_sequence_wraps_year() {
        let keys = build_sequence(Frequency::Monthly, 4, 2025, 11);
        assert_eq!(
            keys,
            vec![
                PeriodKey::monthly(2025, 11),
                PeriodKey::monthly(2025, 12),
                PeriodKey::monthly(2026, 1),
                PeriodKey::monthly(2026, 2),
            ]
        );
    }

    #[test]
    fn test_quarterly_sequence_starts_in_containing_quarter() {
        let keys = build_sequence(Frequency::Quarterly, 3, 2025, 8);
        assert_eq!(
            keys,
            vec![
                PeriodKey::quarterly(2025, 3),
                PeriodKey::quarterly(2025, 4),
                PeriodKey::quarterly(2026, 1),
            ]
        );
    }

    #[test]
    fn test_validate_key_shape() {
        assert!(PeriodKey::annual(2025).validate().is_ok());
        assert!(PeriodKey::monthly(2025, 12).validate().is_ok());
        assert!(PeriodKey::quarterly(2025, 4).validate().is_ok());

        let both = PeriodKey { year: 2025, month: Some(2), quarter: Some(1) };
        assert!(matches!(both.validate(), Err(EngineError::InvalidPeriod { .. })));
        assert!(PeriodKey::monthly(2025, 13).validate().is_err());
        assert!(PeriodKey::monthly(2025, 0).validate().is_err());
        assert!(PeriodKey::quarterly(2025, 5).validate().is_err());
    }

    #[test]
    fn test_calendar_month() {
        assert_eq!(PeriodKey::annual(2025).calendar_month(), 1);
        assert_eq!(PeriodKey::quarterly(2025, 3).calendar_month(), 7);
        assert_eq!(PeriodKey::monthly(2025, 5).calendar_month(), 5);
    }

    #[test]
    fn test_ordering_and_display() {
        let mut keys = vec![
            PeriodKey::monthly(2026, 1),
            PeriodKey::annual(2025),
            PeriodKey::monthly(2025, 12),
        ];
        keys.sort();
        assert_eq!(keys[0], PeriodKey::annual(2025));
        assert_eq!(keys[2], PeriodKey::monthly(2026, 1));

        assert_eq!(PeriodKey::monthly(2025, 3).to_string(), "2025-03");
        assert_eq!(PeriodKey::quarterly(2025, 2).to_string(), "2025-Q2");
        assert_eq!(PeriodKey::annual(2025).to_string(), "2025");
    }
}
