//! Projection storage: the persistence contract and two implementations
//!
//! Every store enforces one projection per (plan, year, month-or-quarter)
//! key and commits generated batches atomically.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::collections::HashSet;

use crate::error::{EngineError, Result};
use crate::period::PeriodKey;
use crate::projection::{FinancialProjection, ProjectionFields};

/// Persistence contract used by the scenario runner and callers
pub trait ProjectionStore {
    /// Projections for a plan in period order, optionally limited to one year
    fn find_projections(&self, plan_id: i64, year: Option<i32>) -> Result<Vec<FinancialProjection>>;

    fn get_projection(&self, id: i64) -> Result<Option<FinancialProjection>>;

    /// Create one projection; fails with `DuplicatePeriod` if the key is taken
    fn create_projection(
        &mut self,
        plan_id: i64,
        period: PeriodKey,
        fields: ProjectionFields,
    ) -> Result<FinancialProjection>;

    /// Persist a whole sequence, all or nothing.
    ///
    /// With `replace_existing`, projections already occupying a key in the
    /// batch are removed as part of the same commit; otherwise an occupied
    /// key fails the batch with `DuplicatePeriod`.
    fn create_batch(
        &mut self,
        projections: &[FinancialProjection],
        replace_existing: bool,
    ) -> Result<Vec<FinancialProjection>>;

    /// Overwrite the fields that are set; fails with `ProjectionNotFound`
    fn update_projection(&mut self, id: i64, fields: ProjectionFields) -> Result<FinancialProjection>;

    /// Remove a projection, reporting whether it existed
    fn delete_projection(&mut self, id: i64) -> Result<bool>;
}

/// Check a batch before anything is written: every key well-formed and none
/// repeated within the batch. Returns the batch's keys.
pub(crate) fn check_batch(projections: &[FinancialProjection]) -> Result<HashSet<(i64, PeriodKey)>> {
    let mut keys = HashSet::with_capacity(projections.len());
    for p in projections {
        p.period.validate()?;
        if !keys.insert((p.plan_id, p.period)) {
            log::warn!("rejecting batch for plan {}: period {} repeated", p.plan_id, p.period);
            return Err(EngineError::DuplicatePeriod {
                plan_id: p.plan_id,
                period: p.period,
            });
        }
    }
    Ok(keys)
}
