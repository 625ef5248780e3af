//! Scenario templates and their resolution into scenario requests
//!
//! A template is a named bundle of default parameter values plus the names
//! of parameters a caller must supply. Resolution merges caller overrides on
//! top of the defaults and maps the merged set onto [`ScenarioRequest`]
//! through an explicit whitelist of parameter names.

mod catalog;
mod params;

pub use catalog::{BuiltinCatalog, JsonCatalog, TemplateCatalog};
pub use params::{apply_parameter, normalize_key, ParamValue, KNOWN_PARAMETERS};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::projection::ScenarioRequest;

/// Parameter map keyed by parameter name
pub type Parameters = BTreeMap<String, ParamValue>;

/// Reusable default parameter set for an industry-typical scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_parameters: Parameters,
    #[serde(default)]
    pub required_parameters: Vec<String>,
}

impl Template {
    /// Merge overrides over defaults; overrides win on key collision.
    ///
    /// Keys are normalised so `churnRate` and `churn_rate` collide.
    pub fn merged_parameters(&self, overrides: &Parameters) -> Parameters {
        let mut merged: Parameters = self
            .default_parameters
            .iter()
            .map(|(key, value)| (normalize_key(key), value.clone()))
            .collect();
        for (key, value) in overrides {
            merged.insert(normalize_key(key), value.clone());
        }
        merged
    }

    /// Build a scenario request from defaults plus overrides
    pub fn resolve(&self, overrides: &Parameters) -> Result<ScenarioRequest> {
        let merged = self.merged_parameters(overrides);

        if let Some(missing) = self
            .required_parameters
            .iter()
            .find(|required| !merged.contains_key(&normalize_key(required)))
        {
            return Err(EngineError::MissingParameter {
                template: self.id.clone(),
                parameter: missing.clone(),
            });
        }

        let mut request = ScenarioRequest {
            name: self.name.clone(),
            ..Default::default()
        };
        for (key, value) in &merged {
            if !apply_parameter(&mut request, key, value)? {
                log::warn!("template '{}': ignoring unknown parameter '{}'", self.id, key);
            }
        }

        log::debug!(
            "resolved template '{}' with {} parameters ({} overrides)",
            self.id,
            merged.len(),
            overrides.len(),
        );
        Ok(request)
    }
}

/// Looks templates up in a catalog and resolves them
pub struct TemplateResolver<C: TemplateCatalog> {
    catalog: C,
}

impl<C: TemplateCatalog> TemplateResolver<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Resolve `template_id` with caller overrides into a scenario request
    pub fn resolve(&self, template_id: &str, overrides: &Parameters) -> Result<ScenarioRequest> {
        let template = self
            .catalog
            .find(template_id)?
            .ok_or_else(|| EngineError::UnknownTemplate(template_id.to_string()))?;
        template.resolve(overrides)
    }
}
