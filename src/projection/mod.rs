//! Scenario-driven projection generation

mod state;
mod engine;
mod cashflows;
mod request;

pub use state::ScenarioState;
pub use engine::ScenarioGenerator;
pub use cashflows::{FinancialProjection, ProjectionFields};
pub use request::{ScenarioRequest, SEASONALITY_MONTHS};

use crate::error::Result;

/// Generate the ordered forecast for `plan_id` from a scenario request
pub fn generate(plan_id: i64, request: &ScenarioRequest) -> Result<Vec<FinancialProjection>> {
    Ok(ScenarioGenerator::new(request.clone())?.generate(plan_id))
}
