//! Typed mapping of template parameters onto scenario request fields

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::period::Frequency;
use crate::projection::ScenarioRequest;

/// Parameter names understood by [`apply_parameter`]
pub const KNOWN_PARAMETERS: &[&str] = &[
    "name",
    "start_year",
    "start_month",
    "projection_years",
    "frequency",
    "initial_revenue",
    "revenue_growth_rate",
    "price_per_unit",
    "cogs_percentage",
    "opex_percentage",
    "marketing_percentage",
    "initial_customers",
    "customer_growth_rate",
    "churn_rate",
    "average_revenue_per_customer",
    "initial_employees",
    "employee_growth_rate",
    "average_salary",
    "initial_cash",
    "monthly_burn_rate",
    "seasonality",
];

/// A single template parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
    List(Vec<f64>),
}

impl ParamValue {
    /// Parse a command-line style value: number, comma list, or text
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(number) = raw.parse::<f64>() {
            return ParamValue::Number(number);
        }
        if raw.contains(',') {
            let parsed: std::result::Result<Vec<f64>, _> =
                raw.split(',').map(|part| part.trim().parse::<f64>()).collect();
            if let Ok(list) = parsed {
                return ParamValue::List(list);
            }
        }
        ParamValue::Text(raw.to_string())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::List(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

/// Normalise `camelCase` and `kebab-case` keys to `snake_case`
pub fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.trim().chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '-' || ch == ' ' {
            out.push('_');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Set one request field from a parameter.
///
/// Returns `Ok(false)` for names outside [`KNOWN_PARAMETERS`]; a known name
/// with a value of the wrong shape is an [`EngineError::InvalidParameter`].
pub fn apply_parameter(request: &mut ScenarioRequest, key: &str, value: &ParamValue) -> Result<bool> {
    let key = normalize_key(key);
    match key.as_str() {
        "name" | "scenario_name" => request.name = text(&key, value)?,
        "start_year" => request.start_year = whole_i32(&key, value)?,
        "start_month" => request.start_month = bounded(&key, value, 1, 12)? as u32,
        "projection_years" => request.projection_years = whole_i32(&key, value)?,
        "frequency" => request.frequency = Frequency::parse(&text(&key, value)?),
        "initial_revenue" => request.initial_revenue = number(&key, value)?,
        "revenue_growth_rate" => request.revenue_growth_rate = number(&key, value)?,
        "price_per_unit" => request.price_per_unit = number(&key, value)?,
        "cogs_percentage" => request.cogs_percentage = number(&key, value)?,
        "opex_percentage" => request.opex_percentage = number(&key, value)?,
        "marketing_percentage" => request.marketing_percentage = number(&key, value)?,
        "initial_customers" => request.initial_customers = non_negative(&key, value)? as u64,
        "customer_growth_rate" => request.customer_growth_rate = number(&key, value)?,
        "churn_rate" => request.churn_rate = number(&key, value)?,
        "average_revenue_per_customer" => request.average_revenue_per_customer = number(&key, value)?,
        "initial_employees" => {
            request.initial_employees = u32::try_from(non_negative(&key, value)?)
                .map_err(|_| invalid(&key, "too large"))?
        }
        "employee_growth_rate" => request.employee_growth_rate = number(&key, value)?,
        "average_salary" => request.average_salary = number(&key, value)?,
        "initial_cash" => request.initial_cash = number(&key, value)?,
        "monthly_burn_rate" => request.monthly_burn_rate = number(&key, value)?,
        "seasonality" => request.seasonality = Some(list(&key, value)?),
        _ => return Ok(false),
    }
    Ok(true)
}

fn invalid(key: &str, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidParameter {
        parameter: key.to_string(),
        reason: reason.into(),
    }
}

fn number(key: &str, value: &ParamValue) -> Result<f64> {
    let parsed = match value {
        ParamValue::Number(n) => *n,
        ParamValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(key, format!("expected a number, got '{s}'")))?,
        ParamValue::List(_) => return Err(invalid(key, "expected a number, got a list")),
    };
    if !parsed.is_finite() {
        return Err(invalid(key, "must be finite"));
    }
    Ok(parsed)
}

fn integer(key: &str, value: &ParamValue) -> Result<i64> {
    let n = number(key, value)?;
    if n.fract() != 0.0 {
        return Err(invalid(key, format!("expected a whole number, got {n}")));
    }
    Ok(n as i64)
}

fn whole_i32(key: &str, value: &ParamValue) -> Result<i32> {
    i32::try_from(integer(key, value)?).map_err(|_| invalid(key, "out of range"))
}

fn non_negative(key: &str, value: &ParamValue) -> Result<i64> {
    let n = integer(key, value)?;
    if n < 0 {
        return Err(invalid(key, "must not be negative"));
    }
    Ok(n)
}

fn bounded(key: &str, value: &ParamValue, min: i64, max: i64) -> Result<i64> {
    let n = integer(key, value)?;
    if n < min || n > max {
        return Err(invalid(key, format!("must be between {min} and {max}")));
    }
    Ok(n)
}

fn text(key: &str, value: &ParamValue) -> Result<String> {
    match value {
        ParamValue::Text(s) => Ok(s.clone()),
        ParamValue::Number(n) => Ok(n.to_string()),
        ParamValue::List(_) => Err(invalid(key, "expected text, got a list")),
    }
}

fn list(key: &str, value: &ParamValue) -> Result<Vec<f64>> {
    match value {
        ParamValue::List(values) => Ok(values.clone()),
        ParamValue::Text(s) => match ParamValue::parse(s) {
            ParamValue::List(values) => Ok(values),
            _ => Err(invalid(key, "expected a list of numbers")),
        },
        ParamValue::Number(_) => Err(invalid(key, "expected a list of numbers")),
    }
}
