//! Scenario runner: generate, analyse and persist forecasts
//!
//! Holds the template catalog and engine configuration once, then runs
//! any number of scenarios against a store without reloading either.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::metrics::{calculate_with, FinancialMetrics};
use crate::projection::{FinancialProjection, ScenarioGenerator, ScenarioRequest};
use crate::storage::ProjectionStore;
use crate::template::{BuiltinCatalog, Parameters, TemplateCatalog, TemplateResolver};
use crate::validation::{validate_sequence, FinancialValidationResult};

/// A persisted scenario with its analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedScenario {
    pub plan_id: i64,
    pub name: String,
    pub generated_at: DateTime<Utc>,
    /// Stored projections, carrying their storage ids
    pub projections: Vec<FinancialProjection>,
    pub metrics: FinancialMetrics,
    pub validation: FinancialValidationResult,
}

/// One side of a scenario comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub name: String,
    pub projections: Vec<FinancialProjection>,
    pub metrics: FinancialMetrics,
    pub validation: FinancialValidationResult,
}

pub struct ScenarioRunner<C: TemplateCatalog = BuiltinCatalog> {
    resolver: TemplateResolver<C>,
    config: EngineConfig,
}

impl ScenarioRunner<BuiltinCatalog> {
    /// Runner over the built-in templates with default thresholds
    pub fn new() -> Self {
        Self::with_catalog(BuiltinCatalog, EngineConfig::default())
    }
}

impl Default for ScenarioRunner<BuiltinCatalog> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TemplateCatalog> ScenarioRunner<C> {
    pub fn with_catalog(catalog: C, config: EngineConfig) -> Self {
        Self {
            resolver: TemplateResolver::new(catalog),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &TemplateResolver<C> {
        &self.resolver
    }

    /// Generate without persisting
    pub fn generate(&self, plan_id: i64, request: &ScenarioRequest) -> Result<Vec<FinancialProjection>> {
        Ok(ScenarioGenerator::new(request.clone())?.generate(plan_id))
    }

    /// Generate a scenario and store every period in one batch.
    ///
    /// With `replace_existing` the scenario's periods overwrite whatever the
    /// plan already holds at those keys; otherwise any occupied key fails the
    /// run and nothing is written. Validation findings are reported, never
    /// enforced.
    pub fn run<S: ProjectionStore>(
        &self,
        store: &mut S,
        plan_id: i64,
        request: &ScenarioRequest,
        replace_existing: bool,
    ) -> Result<GeneratedScenario> {
        let generated = self.generate(plan_id, request)?;
        let projections = store.create_batch(&generated, replace_existing)?;

        let metrics = calculate_with(plan_id, &projections, &self.config.metrics);
        let validation =
            FinancialValidationResult::merge(&validate_sequence(&projections, &self.config.validation));

        log::info!(
            "plan {}: stored scenario '{}' ({} periods, grade {}, {} warnings)",
            plan_id,
            request.name,
            projections.len(),
            metrics.health_score,
            validation.warnings.len(),
        );

        Ok(GeneratedScenario {
            plan_id,
            name: request.name.clone(),
            generated_at: Utc::now(),
            projections,
            metrics,
            validation,
        })
    }

    /// Resolve a template with overrides, then [`run`](Self::run) it
    pub fn run_template<S: ProjectionStore>(
        &self,
        store: &mut S,
        plan_id: i64,
        template_id: &str,
        overrides: &Parameters,
        replace_existing: bool,
    ) -> Result<GeneratedScenario> {
        let request = self.resolver.resolve(template_id, overrides)?;
        self.run(store, plan_id, &request, replace_existing)
    }

    /// Generate and analyse several scenarios for one plan in parallel.
    ///
    /// Nothing is persisted. Results keep the order of `scenarios`.
    pub fn compare(&self, plan_id: i64, scenarios: &[ScenarioRequest]) -> Result<Vec<ScenarioComparison>> {
        let config = &self.config;
        scenarios
            .par_iter()
            .map(|request| -> Result<ScenarioComparison> {
                let projections = ScenarioGenerator::new(request.clone())?.generate(plan_id);
                let metrics = calculate_with(plan_id, &projections, &config.metrics);
                let validation =
                    FinancialValidationResult::merge(&validate_sequence(&projections, &config.validation));
                Ok(ScenarioComparison {
                    name: request.name.clone(),
                    projections,
                    metrics,
                    validation,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::metrics::HealthGrade;
    use crate::period::PeriodKey;
    use crate::projection::ProjectionFields;
    use crate::storage::MemoryStore;
    use crate::template::ParamValue;

    fn request(name: &str, growth: f64) -> ScenarioRequest {
        ScenarioRequest {
            name: name.to_string(),
            start_year: 2025,
            projection_years: 3,
            initial_revenue: 100_000.0,
            revenue_growth_rate: growth,
            cogs_percentage: 0.3,
            opex_percentage: 0.2,
            initial_cash: 50_000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_persists_every_period() {
        let runner = ScenarioRunner::new();
        let mut store = MemoryStore::new();

        let scenario = runner.run(&mut store, 1, &request("Base", 0.2), false).unwrap();
        assert_eq!(scenario.projections.len(), 3);
        assert!(scenario.projections.iter().all(|p| p.id.is_some()));
        assert_eq!(store.find_projections(1, None).unwrap(), scenario.projections);
        assert_eq!(scenario.metrics.period_count, 3);
        assert!(scenario.validation.is_valid);
    }

    #[test]
    fn test_run_refuses_occupied_periods_unless_replacing() {
        let runner = ScenarioRunner::new();
        let mut store = MemoryStore::new();
        store
            .create_projection(1, PeriodKey::annual(2026), ProjectionFields::default())
            .unwrap();

        let err = runner.run(&mut store, 1, &request("Base", 0.2), false).unwrap_err();
        assert!(matches!(err, EngineError::DuplicatePeriod { .. }));
        assert_eq!(store.len(), 1);

        runner.run(&mut store, 1, &request("Base", 0.2), true).unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_run_template_applies_overrides() {
        let runner = ScenarioRunner::new();
        let mut store = MemoryStore::new();
        let overrides: Parameters = [
            ("startYear".to_string(), ParamValue::Number(2026.0)),
            ("initial_cash".to_string(), ParamValue::Number(250_000.0)),
            ("projection_years".to_string(), ParamValue::Number(1.0)),
        ]
        .into_iter()
        .collect();

        let scenario = runner
            .run_template(&mut store, 9, "saas", &overrides, false)
            .unwrap();
        assert_eq!(scenario.name, "SaaS startup");
        assert_eq!(scenario.projections.len(), 12);
        assert_eq!(scenario.projections[0].period, PeriodKey::monthly(2026, 1));

        assert!(matches!(
            runner.run_template(&mut store, 9, "saas", &Parameters::new(), true),
            Err(EngineError::MissingParameter { .. })
        ));
        assert!(matches!(
            runner.run_template(&mut store, 9, "bakery", &overrides, true),
            Err(EngineError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn test_compare_keeps_order_and_ranks_growth() {
        let runner = ScenarioRunner::new();
        let scenarios = vec![request("Flat", 0.0), request("Fast", 0.5), request("Shrinking", -0.2)];

        let results = runner.compare(1, &scenarios).unwrap();
        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Flat", "Fast", "Shrinking"]);

        let total = |i: usize| results[i].metrics.revenue.total_revenue;
        assert!(total(1) > total(0));
        assert!(total(0) > total(2));
        assert!(results[1].metrics.health_score <= results[2].metrics.health_score);
        assert_ne!(results[2].metrics.health_score, HealthGrade::A);
    }

    #[test]
    fn test_compare_surfaces_invalid_request() {
        let runner = ScenarioRunner::new();
        let mut bad = request("Bad", 0.1);
        bad.seasonality = Some(vec![1.0; 5]);
        assert!(matches!(
            runner.compare(1, &[request("Ok", 0.1), bad]),
            Err(EngineError::InvalidSeasonality { len: 5 })
        ));
    }
}
