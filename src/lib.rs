//! Plan Forecast - financial projection engine for business plans
//!
//! This library provides:
//! - Period sequencing at yearly, quarterly or monthly cadence
//! - Scenario generation: compounding revenue, customer growth/churn, headcount and cash
//! - Industry templates resolved into scenario requests
//! - Financial metrics, health grading and rule-based insights
//! - Internal-consistency validation of stored projections
//! - Projection storage (in-memory and SQLite) and csv/json/excel export

pub mod period;
pub mod projection;
pub mod template;
pub mod metrics;
pub mod validation;
pub mod storage;
pub mod export;
pub mod scenario;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use period::{Frequency, PeriodKey};
pub use projection::{FinancialProjection, ProjectionFields, ScenarioGenerator, ScenarioRequest};
pub use template::{Template, TemplateResolver};
pub use metrics::{FinancialMetrics, HealthGrade};
pub use validation::FinancialValidationResult;
pub use storage::{MemoryStore, ProjectionStore, SqliteStore};
pub use export::{ExportFormat, ExportPayload};
pub use scenario::ScenarioRunner;
pub use config::EngineConfig;
pub use error::{EngineError, Result};
