//! Internal-consistency checks for projections
//!
//! Findings are returned as data. Errors mark a projection invalid; warnings
//! and suggestions are advisory and never block generation or persistence.

mod rules;

pub use rules::ValidationRules;

use serde::{Deserialize, Serialize};

use crate::period::PeriodKey;
use crate::projection::FinancialProjection;

/// Outcome of validating one projection (or a merged bundle)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    /// 0-100, penalised per warning and (more heavily) per error
    pub health_score: u8,
}

impl FinancialValidationResult {
    fn from_findings(
        errors: Vec<String>,
        warnings: Vec<String>,
        suggestions: Vec<String>,
        rules: &ValidationRules,
    ) -> Self {
        let penalty = warnings.len() as u32 * rules.warning_penalty
            + errors.len() as u32 * rules.error_penalty;
        Self {
            is_valid: errors.is_empty(),
            health_score: 100u32.saturating_sub(penalty) as u8,
            errors,
            warnings,
            suggestions,
        }
    }

    /// Combine per-period results into one summary.
    ///
    /// Messages are prefixed with their period; the score is the mean of the
    /// period scores.
    pub fn merge<'a>(results: impl IntoIterator<Item = &'a (PeriodKey, FinancialValidationResult)>) -> Self {
        let mut merged = Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
            health_score: 100,
        };
        let mut score_total = 0u32;
        let mut count = 0u32;

        for (period, result) in results {
            merged.is_valid &= result.is_valid;
            merged.errors.extend(result.errors.iter().map(|e| format!("{period}: {e}")));
            merged.warnings.extend(result.warnings.iter().map(|w| format!("{period}: {w}")));
            for suggestion in &result.suggestions {
                if !merged.suggestions.contains(suggestion) {
                    merged.suggestions.push(suggestion.clone());
                }
            }
            score_total += result.health_score as u32;
            count += 1;
        }

        if count > 0 {
            merged.health_score = (score_total as f64 / count as f64).round() as u8;
        }
        merged
    }
}

/// What a bulk validation knows about the periods before the current one
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValidationContext {
    /// Cash balance at the end of the previous period
    pub prior_cash_balance: Option<f64>,
    /// Consecutive net-loss periods immediately before this one
    pub prior_loss_streak: u32,
}

impl ValidationContext {
    /// Context for the period following `projection`
    pub fn advance(self, projection: &FinancialProjection) -> Self {
        Self {
            prior_cash_balance: projection.cash_balance,
            prior_loss_streak: if is_net_loss(projection) {
                self.prior_loss_streak + 1
            } else {
                0
            },
        }
    }
}

fn is_net_loss(projection: &FinancialProjection) -> bool {
    projection
        .revenue
        .is_some_and(|revenue| projection.total_expenses() > revenue)
}

/// Validate a single projection with default rules and no period context
pub fn validate(projection: &FinancialProjection) -> FinancialValidationResult {
    validate_with(projection, &ValidationContext::default(), &ValidationRules::default())
}

/// Validate a single projection given what is known about prior periods
pub fn validate_with(
    projection: &FinancialProjection,
    context: &ValidationContext,
    rules: &ValidationRules,
) -> FinancialValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut suggestions = Vec::new();

    let amounts = [
        ("Revenue", projection.revenue),
        ("Cost of goods sold", projection.cost_of_goods_sold),
        ("Operating expenses", projection.operating_expenses),
        ("Marketing expenses", projection.marketing_expenses),
        ("R&D expenses", projection.rd_expenses),
        ("Administrative expenses", projection.administrative_expenses),
        ("Other expenses", projection.other_expenses),
    ];
    for (label, value) in amounts {
        match value {
            Some(v) if !v.is_finite() => errors.push(format!("{label} must be a finite number")),
            Some(v) if v < 0.0 => errors.push(format!("{label} cannot be negative")),
            _ => {}
        }
    }
    for (label, value) in [("Cash flow", projection.cash_flow), ("Cash balance", projection.cash_balance)] {
        if value.is_some_and(|v| !v.is_finite()) {
            errors.push(format!("{label} must be a finite number"));
        }
    }

    if let (Some(balance), Some(cash_flow), Some(prior)) =
        (projection.cash_balance, projection.cash_flow, context.prior_cash_balance)
    {
        let expected = prior + cash_flow;
        let tolerance = rules.cash_tolerance;
        if expected.abs() > tolerance && balance.abs() > tolerance && expected.signum() != balance.signum() {
            errors.push(format!(
                "Cash balance {balance:.2} has the opposite sign of prior balance plus cash flow ({expected:.2})"
            ));
        }
    }

    if let (Some(revenue), Some(cogs)) = (projection.revenue, projection.cost_of_goods_sold) {
        if revenue > 0.0 && cogs > revenue * rules.max_cogs_ratio {
            warnings.push(format!(
                "COGS is {:.1}% of revenue (above {:.0}%)",
                cogs / revenue * 100.0,
                rules.max_cogs_ratio * 100.0
            ));
            suggestions.push("Renegotiate supplier terms or review pricing to improve gross margin".to_string());
        }
    }

    if is_net_loss(projection) {
        let streak = context.prior_loss_streak + 1;
        if streak > rules.max_consecutive_loss_periods {
            warnings.push(format!("Expenses exceed revenue for {streak} consecutive periods"));
            suggestions.push("Build a path to profitability: trim discretionary spend or grow revenue".to_string());
        }
    }

    let documented = projection
        .assumptions
        .as_deref()
        .is_some_and(|text| !text.trim().is_empty());
    if !documented && projection.revenue.is_some_and(|revenue| revenue > rules.trivial_revenue) {
        warnings.push("No assumptions documented for this period's revenue".to_string());
        suggestions.push("Document the assumptions behind this forecast".to_string());
    }

    FinancialValidationResult::from_findings(errors, warnings, suggestions, rules)
}

/// Validate a bundle in period order, threading context between periods
pub fn validate_sequence(
    projections: &[FinancialProjection],
    rules: &ValidationRules,
) -> Vec<(PeriodKey, FinancialValidationResult)> {
    let mut rows: Vec<&FinancialProjection> = projections.iter().collect();
    rows.sort_by_key(|row| row.period);

    rows.into_iter()
        .scan(ValidationContext::default(), |context, projection| {
            let result = validate_with(projection, context, rules);
            *context = context.advance(projection);
            Some((projection.period, result))
        })
        .collect()
}
