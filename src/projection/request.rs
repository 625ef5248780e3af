//! Scenario assumptions supplied to the generator

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::period::Frequency;

/// Number of seasonality factors, one per calendar month
pub const SEASONALITY_MONTHS: usize = 12;

/// Longest horizon a request may ask for (600 monthly periods)
pub const MAX_PROJECTION_YEARS: i32 = 50;

/// Accepted range for the first forecast year
pub const MIN_START_YEAR: i32 = 1900;
pub const MAX_START_YEAR: i32 = 9999;

/// Named bundle of business-model assumptions.
///
/// Monetary inputs (`initial_revenue`, `average_revenue_per_customer`) are
/// per-period amounts at the request's cadence. Customer growth and churn
/// are monthly rates; revenue and employee growth are annual rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioRequest {
    pub name: String,
    pub start_year: i32,
    /// Calendar month of the first period (1-12)
    pub start_month: u32,
    pub projection_years: i32,
    pub frequency: Frequency,

    // Revenue
    pub initial_revenue: f64,
    pub revenue_growth_rate: f64,
    pub price_per_unit: f64,

    // Costs as fractions of revenue
    pub cogs_percentage: f64,
    pub opex_percentage: f64,
    pub marketing_percentage: f64,

    // Customers
    pub initial_customers: u64,
    pub customer_growth_rate: f64,
    pub churn_rate: f64,
    pub average_revenue_per_customer: f64,

    // Team
    pub initial_employees: u32,
    pub employee_growth_rate: f64,
    pub average_salary: f64,

    // Cash
    pub initial_cash: f64,
    pub monthly_burn_rate: f64,

    /// Monthly revenue multipliers, January first. `None` disables seasonality.
    pub seasonality: Option<Vec<f64>>,
}

impl Default for ScenarioRequest {
    fn default() -> Self {
        Self {
            name: "Base case".to_string(),
            start_year: chrono::Utc::now().year(),
            start_month: 1,
            projection_years: 3,
            frequency: Frequency::Yearly,
            initial_revenue: 0.0,
            revenue_growth_rate: 0.0,
            price_per_unit: 0.0,
            cogs_percentage: 0.0,
            opex_percentage: 0.0,
            marketing_percentage: 0.0,
            initial_customers: 0,
            customer_growth_rate: 0.0,
            churn_rate: 0.0,
            average_revenue_per_customer: 0.0,
            initial_employees: 0,
            employee_growth_rate: 0.0,
            average_salary: 0.0,
            initial_cash: 0.0,
            monthly_burn_rate: 0.0,
            seasonality: None,
        }
    }
}

impl ScenarioRequest {
    /// Total number of periods to generate; zero when `projection_years <= 0`
    pub fn total_periods(&self) -> usize {
        if self.projection_years <= 0 {
            return 0;
        }
        self.projection_years as usize * self.frequency.periods_per_year() as usize
    }

    /// Revenue follows the customer base only when both drivers are positive
    pub fn is_customer_driven(&self) -> bool {
        self.average_revenue_per_customer > 0.0 && self.initial_customers > 0
    }

    /// Seasonality factor for a calendar month (1-12), 1.0 when disabled
    pub fn seasonality_factor(&self, calendar_month: u32) -> f64 {
        match &self.seasonality {
            Some(factors) if !factors.is_empty() => {
                let idx = (calendar_month.max(1) as usize - 1) % factors.len();
                factors[idx]
            }
            _ => 1.0,
        }
    }

    /// Reject requests whose seasonality list is not one factor per month
    pub fn check_seasonality(&self) -> Result<()> {
        match &self.seasonality {
            Some(factors) if factors.len() != SEASONALITY_MONTHS => {
                Err(EngineError::InvalidSeasonality { len: factors.len() })
            }
            _ => Ok(()),
        }
    }

    /// Reject requests the generator cannot turn into a sane forecast.
    ///
    /// Annual growth below -100% has no per-period equivalent, and every
    /// numeric input must be finite.
    pub fn check(&self) -> Result<()> {
        self.check_seasonality()?;

        if self.projection_years > MAX_PROJECTION_YEARS {
            return Err(invalid(
                "projection_years",
                format!("at most {MAX_PROJECTION_YEARS} years, got {}", self.projection_years),
            ));
        }
        if !(MIN_START_YEAR..=MAX_START_YEAR).contains(&self.start_year) {
            return Err(invalid(
                "start_year",
                format!("must be between {MIN_START_YEAR} and {MAX_START_YEAR}"),
            ));
        }

        let inputs = [
            ("initial_revenue", self.initial_revenue),
            ("revenue_growth_rate", self.revenue_growth_rate),
            ("price_per_unit", self.price_per_unit),
            ("cogs_percentage", self.cogs_percentage),
            ("opex_percentage", self.opex_percentage),
            ("marketing_percentage", self.marketing_percentage),
            ("customer_growth_rate", self.customer_growth_rate),
            ("churn_rate", self.churn_rate),
            ("average_revenue_per_customer", self.average_revenue_per_customer),
            ("employee_growth_rate", self.employee_growth_rate),
            ("average_salary", self.average_salary),
            ("initial_cash", self.initial_cash),
            ("monthly_burn_rate", self.monthly_burn_rate),
        ];
        if let Some((name, _)) = inputs.iter().find(|(_, value)| !value.is_finite()) {
            return Err(invalid(name, "must be a finite number"));
        }
        if self.seasonality.iter().flatten().any(|factor| !factor.is_finite()) {
            return Err(invalid("seasonality", "factors must be finite numbers"));
        }

        for (name, rate) in [
            ("revenue_growth_rate", self.revenue_growth_rate),
            ("employee_growth_rate", self.employee_growth_rate),
        ] {
            if rate < -1.0 {
                return Err(invalid(name, format!("annual rate {rate} is below -100%")));
            }
        }
        Ok(())
    }

    /// Load a request file. Unlike plain deserialization, `start_year` must
    /// be present so the forecast does not depend on when it runs.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_value(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Load a JSON array of requests, each with an explicit `start_year`
    pub fn list_from_reader<R: Read>(reader: R) -> Result<Vec<Self>> {
        let values: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
        values.into_iter().map(Self::from_value).collect()
    }

    fn from_value(value: serde_json::Value) -> Result<Self> {
        if value.get("start_year").is_none() {
            return Err(invalid("start_year", "required in request files"));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Human-readable summary stored on generated projections
    pub fn assumptions_summary(&self) -> String {
        let mut summary = format!(
            "Revenue growth {:.1}%/yr; COGS {:.1}%, OpEx {:.1}%, marketing {:.1}% of revenue; \
             {} employees at {:.0} avg salary growing {:.1}%/yr; burn {:.0}/month",
            self.revenue_growth_rate * 100.0,
            self.cogs_percentage * 100.0,
            self.opex_percentage * 100.0,
            self.marketing_percentage * 100.0,
            self.initial_employees,
            self.average_salary,
            self.employee_growth_rate * 100.0,
            self.monthly_burn_rate,
        );
        if self.is_customer_driven() {
            summary.push_str(&format!(
                "; {} customers at {:.2}/period, growth {:.1}%/month, churn {:.1}%/month",
                self.initial_customers,
                self.average_revenue_per_customer,
                self.customer_growth_rate * 100.0,
                self.churn_rate * 100.0,
            ));
        }
        if self.seasonality.is_some() {
            summary.push_str("; seasonality applied");
        }
        summary
    }
}

fn invalid(parameter: &str, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidParameter {
        parameter: parameter.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_periods() {
        let request = ScenarioRequest {
            projection_years: 2,
            frequency: Frequency::Quarterly,
            ..Default::default()
        };
        assert_eq!(request.total_periods(), 8);

        let empty = ScenarioRequest { projection_years: 0, ..Default::default() };
        assert_eq!(empty.total_periods(), 0);

        let negative = ScenarioRequest { projection_years: -3, ..Default::default() };
        assert_eq!(negative.total_periods(), 0);
    }

    #[test]
    fn test_seasonality_length_checked() {
        let request = ScenarioRequest {
            seasonality: Some(vec![1.0; 11]),
            ..Default::default()
        };
        assert!(matches!(
            request.check_seasonality(),
            Err(EngineError::InvalidSeasonality { len: 11 })
        ));

        let disabled = ScenarioRequest::default();
        assert!(disabled.check_seasonality().is_ok());
        assert_eq!(disabled.seasonality_factor(5), 1.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let request: ScenarioRequest = serde_json::from_str(
            r#"{"name": "Lean", "initial_revenue": 5000.0, "frequency": "monthly"}"#,
        )
        .unwrap();
        assert_eq!(request.name, "Lean");
        assert_eq!(request.frequency, Frequency::Monthly);
        assert_eq!(request.projection_years, 3);
        assert_eq!(request.seasonality, None);
    }

    #[test]
    fn test_check_rejects_unusable_rates() {
        let base = ScenarioRequest { start_year: 2025, ..Default::default() };
        assert!(base.check().is_ok());

        let collapsing = ScenarioRequest { revenue_growth_rate: -1.5, ..base.clone() };
        assert!(matches!(
            collapsing.check(),
            Err(EngineError::InvalidParameter { parameter, .. }) if parameter == "revenue_growth_rate"
        ));

        let shrinking_team = ScenarioRequest { employee_growth_rate: -2.0, ..base.clone() };
        assert!(shrinking_team.check().is_err());

        let wiped_out = ScenarioRequest { revenue_growth_rate: -1.0, ..base.clone() };
        assert!(wiped_out.check().is_ok());

        let nan_churn = ScenarioRequest { churn_rate: f64::NAN, ..base.clone() };
        assert!(matches!(
            nan_churn.check(),
            Err(EngineError::InvalidParameter { parameter, .. }) if parameter == "churn_rate"
        ));

        let bad_factor = ScenarioRequest {
            seasonality: Some(vec![f64::INFINITY; SEASONALITY_MONTHS]),
            ..base
        };
        assert!(bad_factor.check().is_err());
    }

    #[test]
    fn test_check_bounds_horizon_and_start_year() {
        let base = ScenarioRequest { start_year: 2025, ..Default::default() };
        let longest = ScenarioRequest { projection_years: MAX_PROJECTION_YEARS, ..base.clone() };
        assert!(longest.check().is_ok());

        let huge = ScenarioRequest { projection_years: 1_000_000_000, ..base.clone() };
        assert!(matches!(
            huge.check(),
            Err(EngineError::InvalidParameter { parameter, .. }) if parameter == "projection_years"
        ));

        let far_future = ScenarioRequest { start_year: i32::MAX, ..base };
        assert!(far_future.check().is_err());
    }

    #[test]
    fn test_request_file_requires_start_year() {
        let err = ScenarioRequest::from_reader(r#"{"initial_revenue": 5000.0}"#.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidParameter { parameter, .. } if parameter == "start_year"
        ));

        let request =
            ScenarioRequest::from_reader(r#"{"start_year": 2030, "initial_revenue": 5000.0}"#.as_bytes())
                .unwrap();
        assert_eq!(request.start_year, 2030);

        let list = ScenarioRequest::list_from_reader(r#"[{"start_year": 2030}, {"name": "x"}]"#.as_bytes());
        assert!(list.is_err());
    }

    #[test]
    fn test_customer_driven_requires_both_drivers() {
        let mut request = ScenarioRequest {
            initial_customers: 10,
            ..Default::default()
        };
        assert!(!request.is_customer_driven());
        request.average_revenue_per_customer = 50.0;
        assert!(request.is_customer_driven());
    }
}
