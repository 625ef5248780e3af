//! Template catalogs: built-in industry defaults and JSON files

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::{ParamValue, Parameters, Template};
use crate::error::Result;

/// Default path to a user-supplied template file
pub const DEFAULT_TEMPLATES_PATH: &str = "data/templates.json";

/// Source of scenario templates
pub trait TemplateCatalog {
    fn list_templates(&self) -> Result<Vec<Template>>;

    /// Look a template up by id
    fn find(&self, template_id: &str) -> Result<Option<Template>> {
        Ok(self
            .list_templates()?
            .into_iter()
            .find(|template| template.id == template_id))
    }

    /// Templates in a category (case-insensitive)
    fn by_category(&self, category: &str) -> Result<Vec<Template>> {
        Ok(self
            .list_templates()?
            .into_iter()
            .filter(|template| template.category.eq_ignore_ascii_case(category))
            .collect())
    }
}

impl<C: TemplateCatalog + ?Sized> TemplateCatalog for &C {
    fn list_templates(&self) -> Result<Vec<Template>> {
        (**self).list_templates()
    }
}

/// Industry templates shipped with the engine
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl TemplateCatalog for BuiltinCatalog {
    fn list_templates(&self) -> Result<Vec<Template>> {
        Ok(vec![
            template(
                "saas",
                "SaaS startup",
                "software",
                "Subscription software with monthly customer growth and churn",
                &[
                    ("frequency", text("monthly")),
                    ("projection_years", num(3.0)),
                    ("initial_revenue", num(10_000.0)),
                    ("revenue_growth_rate", num(0.8)),
                    ("cogs_percentage", num(0.2)),
                    ("opex_percentage", num(0.25)),
                    ("marketing_percentage", num(0.2)),
                    ("initial_customers", num(100.0)),
                    ("customer_growth_rate", num(0.08)),
                    ("churn_rate", num(0.03)),
                    ("average_revenue_per_customer", num(100.0)),
                    ("initial_employees", num(5.0)),
                    ("employee_growth_rate", num(0.5)),
                    ("average_salary", num(95_000.0)),
                    ("monthly_burn_rate", num(5_000.0)),
                ],
                &["start_year", "initial_cash"],
            ),
            template(
                "ecommerce",
                "E-commerce store",
                "retail",
                "Online retail with unit economics and holiday seasonality",
                &[
                    ("frequency", text("monthly")),
                    ("projection_years", num(3.0)),
                    ("initial_revenue", num(40_000.0)),
                    ("revenue_growth_rate", num(0.35)),
                    ("price_per_unit", num(45.0)),
                    ("cogs_percentage", num(0.55)),
                    ("opex_percentage", num(0.12)),
                    ("marketing_percentage", num(0.15)),
                    ("initial_employees", num(4.0)),
                    ("employee_growth_rate", num(0.25)),
                    ("average_salary", num(55_000.0)),
                    ("monthly_burn_rate", num(2_000.0)),
                    (
                        "seasonality",
                        ParamValue::List(vec![
                            0.8, 0.8, 0.9, 0.9, 1.0, 0.95, 0.9, 0.95, 1.0, 1.1, 1.3, 1.5,
                        ]),
                    ),
                ],
                &["start_year", "initial_cash"],
            ),
            template(
                "restaurant",
                "Restaurant",
                "hospitality",
                "Single-location restaurant with summer peak",
                &[
                    ("frequency", text("quarterly")),
                    ("projection_years", num(5.0)),
                    ("initial_revenue", num(180_000.0)),
                    ("revenue_growth_rate", num(0.08)),
                    ("cogs_percentage", num(0.32)),
                    ("opex_percentage", num(0.30)),
                    ("marketing_percentage", num(0.04)),
                    ("initial_employees", num(14.0)),
                    ("employee_growth_rate", num(0.05)),
                    ("average_salary", num(32_000.0)),
                    ("monthly_burn_rate", num(3_000.0)),
                    (
                        "seasonality",
                        ParamValue::List(vec![
                            0.85, 0.85, 0.9, 1.0, 1.05, 1.15, 1.2, 1.2, 1.05, 0.95, 0.9, 0.9,
                        ]),
                    ),
                ],
                &["start_year", "initial_cash", "initial_revenue"],
            ),
            template(
                "consulting",
                "Consulting practice",
                "services",
                "Professional services firm billed per client engagement",
                &[
                    ("frequency", text("yearly")),
                    ("projection_years", num(5.0)),
                    ("initial_revenue", num(600_000.0)),
                    ("revenue_growth_rate", num(0.15)),
                    ("cogs_percentage", num(0.1)),
                    ("opex_percentage", num(0.15)),
                    ("marketing_percentage", num(0.05)),
                    ("initial_customers", num(12.0)),
                    ("customer_growth_rate", num(0.02)),
                    ("churn_rate", num(0.01)),
                    ("average_revenue_per_customer", num(50_000.0)),
                    ("initial_employees", num(4.0)),
                    ("employee_growth_rate", num(0.2)),
                    ("average_salary", num(85_000.0)),
                ],
                &["start_year", "initial_cash"],
            ),
        ])
    }
}

/// Templates loaded from a JSON array of [`Template`] objects
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    templates: Vec<Template>,
}

impl JsonCatalog {
    /// Load templates from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load templates from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let templates: Vec<Template> = serde_json::from_reader(reader)?;
        Ok(Self { templates })
    }

    /// Load from the default location
    pub fn from_default_path() -> Result<Self> {
        Self::from_path(DEFAULT_TEMPLATES_PATH)
    }

    pub fn with_templates(templates: Vec<Template>) -> Self {
        Self { templates }
    }
}

impl TemplateCatalog for JsonCatalog {
    fn list_templates(&self) -> Result<Vec<Template>> {
        Ok(self.templates.clone())
    }
}

fn num(value: f64) -> ParamValue {
    ParamValue::Number(value)
}

fn text(value: &str) -> ParamValue {
    ParamValue::Text(value.to_string())
}

fn template(
    id: &str,
    name: &str,
    category: &str,
    description: &str,
    defaults: &[(&str, ParamValue)],
    required: &[&str],
) -> Template {
    let default_parameters: Parameters = defaults
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();

    Template {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        default_parameters,
        required_parameters: required.iter().map(|r| r.to_string()).collect(),
    }
}
