//! Running state carried from one forecast period to the next

use super::request::ScenarioRequest;

/// Drivers carried across periods during generation.
///
/// The generator never mutates a state in place: each period consumes the
/// prior state and yields the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioState {
    /// Zero-based index of the period about to be projected
    pub period_index: u32,

    /// Customer base at the end of the last projected period
    pub customers: u64,

    /// Headcount, compounded fractionally and reported rounded
    pub employees: f64,

    /// Cash on hand at the end of the last projected period
    pub cash_balance: f64,
}

impl ScenarioState {
    /// Opening state seeded from the request
    pub fn opening(request: &ScenarioRequest) -> Self {
        Self {
            period_index: 0,
            customers: request.initial_customers,
            employees: request.initial_employees as f64,
            cash_balance: request.initial_cash,
        }
    }

    /// Whether this state describes the first period (no growth applied yet)
    pub fn is_opening(&self) -> bool {
        self.period_index == 0
    }

    /// Apply net monthly customer growth over `months` months.
    ///
    /// The net factor is floored at zero, so heavy churn drives the base to
    /// zero without ever going negative.
    pub fn grow_customers(&self, growth_rate: f64, churn_rate: f64, months: u32) -> u64 {
        let net = (1.0 + growth_rate - churn_rate).max(0.0);
        let grown = self.customers as f64 * net.powi(months as i32);
        grown.round().max(0.0) as u64
    }

    /// Compound headcount by a per-period rate, never below zero
    pub fn grow_employees(&self, period_rate: f64) -> f64 {
        (self.employees * (1.0 + period_rate)).max(0.0)
    }

    /// Reported headcount
    pub fn headcount(&self) -> u32 {
        self.employees.round().max(0.0) as u32
    }
}
