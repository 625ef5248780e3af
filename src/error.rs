//! Error taxonomy for the projection engine

use thiserror::Error;

use crate::period::PeriodKey;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures raised by generation, template resolution, storage and export.
///
/// Validation findings are never reported through this type; they are
/// returned as data in [`crate::validation::FinancialValidationResult`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Template '{template}' requires parameter '{parameter}'")]
    MissingParameter { template: String, parameter: String },

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("Seasonality needs exactly 12 monthly factors, got {len}")]
    InvalidSeasonality { len: usize },

    #[error("Invalid period {period:?}: {reason}")]
    InvalidPeriod { period: PeriodKey, reason: String },

    #[error("Plan {plan_id} already has a projection for {period}")]
    DuplicatePeriod { plan_id: i64, period: PeriodKey },

    #[error("Projection {0} not found")]
    ProjectionNotFound(i64),

    #[error("Unsupported export format: {0} (use csv|json|excel)")]
    UnsupportedExportFormat(String),

    #[error("Storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
