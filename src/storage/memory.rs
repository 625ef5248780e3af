//! In-process projection store

use std::collections::{BTreeMap, HashMap};

use super::{check_batch, ProjectionStore};
use crate::error::{EngineError, Result};
use crate::period::PeriodKey;
use crate::projection::{FinancialProjection, ProjectionFields};

/// Projection store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    next_id: i64,
    rows: BTreeMap<i64, FinancialProjection>,
    by_period: HashMap<(i64, PeriodKey), i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn insert(&mut self, mut projection: FinancialProjection) -> FinancialProjection {
        self.next_id += 1;
        projection.id = Some(self.next_id);
        self.by_period
            .insert((projection.plan_id, projection.period), self.next_id);
        self.rows.insert(self.next_id, projection.clone());
        projection
    }
}

impl ProjectionStore for MemoryStore {
    fn find_projections(&self, plan_id: i64, year: Option<i32>) -> Result<Vec<FinancialProjection>> {
        let mut found: Vec<FinancialProjection> = self
            .rows
            .values()
            .filter(|p| p.plan_id == plan_id && year.map_or(true, |y| p.period.year == y))
            .cloned()
            .collect();
        found.sort_by_key(|p| p.period);
        Ok(found)
    }

    fn get_projection(&self, id: i64) -> Result<Option<FinancialProjection>> {
        Ok(self.rows.get(&id).cloned())
    }

    fn create_projection(
        &mut self,
        plan_id: i64,
        period: PeriodKey,
        fields: ProjectionFields,
    ) -> Result<FinancialProjection> {
        period.validate()?;
        if self.by_period.contains_key(&(plan_id, period)) {
            log::warn!("rejecting duplicate projection for plan {} at {}", plan_id, period);
            return Err(EngineError::DuplicatePeriod { plan_id, period });
        }
        Ok(self.insert(FinancialProjection::from_fields(plan_id, period, fields)))
    }

    fn create_batch(
        &mut self,
        projections: &[FinancialProjection],
        replace_existing: bool,
    ) -> Result<Vec<FinancialProjection>> {
        // Check every key before touching anything
        let keys = check_batch(projections)?;
        if !replace_existing {
            if let Some(&(plan_id, period)) = keys.iter().find(|&key| self.by_period.contains_key(key)) {
                log::warn!("rejecting batch for plan {}: period {} already stored", plan_id, period);
                return Err(EngineError::DuplicatePeriod { plan_id, period });
            }
        }

        if replace_existing {
            for key in &keys {
                if let Some(id) = self.by_period.remove(key) {
                    self.rows.remove(&id);
                }
            }
        }

        Ok(projections
            .iter()
            .map(|p| self.insert(FinancialProjection { id: None, ..p.clone() }))
            .collect())
    }

    fn update_projection(&mut self, id: i64, fields: ProjectionFields) -> Result<FinancialProjection> {
        let projection = self
            .rows
            .get_mut(&id)
            .ok_or(EngineError::ProjectionNotFound(id))?;
        fields.apply_to(projection);
        Ok(projection.clone())
    }

    fn delete_projection(&mut self, id: i64) -> Result<bool> {
        match self.rows.remove(&id) {
            Some(projection) => {
                self.by_period.remove(&(projection.plan_id, projection.period));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract;

    #[test]
    fn test_duplicate_period_rejected() {
        contract::duplicate_period_rejected(&mut MemoryStore::new());
    }

    #[test]
    fn test_batch_is_atomic() {
        contract::batch_is_atomic(&mut MemoryStore::new());
    }

    #[test]
    fn test_batch_rejects_repeated_key() {
        contract::batch_rejects_repeated_key(&mut MemoryStore::new());
    }

    #[test]
    fn test_malformed_period_rejected() {
        contract::malformed_period_rejected(&mut MemoryStore::new());
    }

    #[test]
    fn test_find_update_delete() {
        contract::find_update_delete(&mut MemoryStore::new());
    }
}
