//! Per-period projection rows and partial-update field sets

use serde::{Deserialize, Serialize};

use crate::period::PeriodKey;

/// One forecasted period for one business plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialProjection {
    /// Storage identifier, absent until persisted
    #[serde(default)]
    pub id: Option<i64>,
    pub plan_id: i64,
    pub period: PeriodKey,

    // Income
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub cost_of_goods_sold: Option<f64>,

    // Expense lines
    #[serde(default)]
    pub operating_expenses: Option<f64>,
    #[serde(default)]
    pub marketing_expenses: Option<f64>,
    #[serde(default)]
    pub rd_expenses: Option<f64>,
    #[serde(default)]
    pub administrative_expenses: Option<f64>,
    #[serde(default)]
    pub other_expenses: Option<f64>,

    // Cash
    #[serde(default)]
    pub cash_flow: Option<f64>,
    #[serde(default)]
    pub cash_balance: Option<f64>,

    // Operating drivers
    #[serde(default)]
    pub employee_count: Option<u32>,
    #[serde(default)]
    pub customer_count: Option<u64>,
    #[serde(default)]
    pub units_sold: Option<u64>,
    #[serde(default)]
    pub growth_rate: Option<f64>,

    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub assumptions: Option<String>,
}

impl FinancialProjection {
    /// Create an empty projection for a plan period
    pub fn new(plan_id: i64, period: PeriodKey) -> Self {
        Self {
            id: None,
            plan_id,
            period,
            revenue: None,
            cost_of_goods_sold: None,
            operating_expenses: None,
            marketing_expenses: None,
            rd_expenses: None,
            administrative_expenses: None,
            other_expenses: None,
            cash_flow: None,
            cash_balance: None,
            employee_count: None,
            customer_count: None,
            units_sold: None,
            growth_rate: None,
            notes: None,
            assumptions: None,
        }
    }

    /// Build a projection from a field set (used on creation)
    pub fn from_fields(plan_id: i64, period: PeriodKey, fields: ProjectionFields) -> Self {
        let mut projection = Self::new(plan_id, period);
        fields.apply_to(&mut projection);
        projection
    }

    /// Expense lines that are present, COGS included
    pub fn expense_lines(&self) -> [Option<f64>; 6] {
        [
            self.cost_of_goods_sold,
            self.operating_expenses,
            self.marketing_expenses,
            self.rd_expenses,
            self.administrative_expenses,
            self.other_expenses,
        ]
    }

    /// Sum of all present cost lines, COGS included
    pub fn total_expenses(&self) -> f64 {
        self.expense_lines().iter().flatten().sum()
    }

    /// Revenue less COGS
    pub fn gross_profit(&self) -> Option<f64> {
        self.revenue
            .map(|revenue| revenue - self.cost_of_goods_sold.unwrap_or(0.0))
    }

    /// Revenue less COGS, operating and marketing expenses.
    /// No interest, tax or depreciation lines are modelled.
    pub fn ebitda(&self) -> Option<f64> {
        self.revenue.map(|revenue| {
            revenue
                - self.cost_of_goods_sold.unwrap_or(0.0)
                - self.operating_expenses.unwrap_or(0.0)
                - self.marketing_expenses.unwrap_or(0.0)
        })
    }

    /// Revenue less every cost line
    pub fn net_income(&self) -> Option<f64> {
        self.revenue.map(|revenue| revenue - self.total_expenses())
    }

    /// Calendar months covered by this projection's period
    pub fn months_spanned(&self) -> u32 {
        self.period.months_spanned()
    }
}

/// Field set for creation and partial updates.
///
/// `None` leaves the target field untouched; there is no recalculation of
/// dependent fields or later periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionFields {
    pub revenue: Option<f64>,
    pub cost_of_goods_sold: Option<f64>,
    pub operating_expenses: Option<f64>,
    pub marketing_expenses: Option<f64>,
    pub rd_expenses: Option<f64>,
    pub administrative_expenses: Option<f64>,
    pub other_expenses: Option<f64>,
    pub cash_flow: Option<f64>,
    pub cash_balance: Option<f64>,
    pub employee_count: Option<u32>,
    pub customer_count: Option<u64>,
    pub units_sold: Option<u64>,
    pub growth_rate: Option<f64>,
    pub notes: Option<String>,
    pub assumptions: Option<String>,
}

impl ProjectionFields {
    /// Overwrite every field that is set
    pub fn apply_to(self, projection: &mut FinancialProjection) {
        macro_rules! overwrite {
            ($src:ident => $dst:ident; $($field:ident),* $(,)?) => {
                $(if let Some(value) = $src.$field {
                    $dst.$field = Some(value);
                })*
            };
        }

        let fields = self;
        overwrite!(
            fields => projection;
            revenue,
            cost_of_goods_sold,
            operating_expenses,
            marketing_expenses,
            rd_expenses,
            administrative_expenses,
            other_expenses,
            cash_flow,
            cash_balance,
            employee_count,
            customer_count,
            units_sold,
            growth_rate,
            notes,
            assumptions,
        );
    }

    /// Capture every field of an existing projection
    pub fn from_projection(projection: &FinancialProjection) -> Self {
        Self {
            revenue: projection.revenue,
            cost_of_goods_sold: projection.cost_of_goods_sold,
            operating_expenses: projection.operating_expenses,
            marketing_expenses: projection.marketing_expenses,
            rd_expenses: projection.rd_expenses,
            administrative_expenses: projection.administrative_expenses,
            other_expenses: projection.other_expenses,
            cash_flow: projection.cash_flow,
            cash_balance: projection.cash_balance,
            employee_count: projection.employee_count,
            customer_count: projection.customer_count,
            units_sold: projection.units_sold,
            growth_rate: projection.growth_rate,
            notes: projection.notes.clone(),
            assumptions: projection.assumptions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> FinancialProjection {
        FinancialProjection::from_fields(
            7,
            PeriodKey::annual(2025),
            ProjectionFields {
                revenue: Some(1000.0),
                cost_of_goods_sold: Some(300.0),
                operating_expenses: Some(200.0),
                marketing_expenses: Some(100.0),
                administrative_expenses: Some(150.0),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_derived_lines() {
        let p = sample();
        assert_relative_eq!(p.total_expenses(), 750.0);
        assert_relative_eq!(p.gross_profit().unwrap(), 700.0);
        assert_relative_eq!(p.ebitda().unwrap(), 400.0);
        assert_relative_eq!(p.net_income().unwrap(), 250.0);
    }

    #[test]
    fn test_partial_update_keeps_untouched_fields() {
        let mut p = sample();
        ProjectionFields {
            revenue: Some(2000.0),
            notes: Some("revised".to_string()),
            ..Default::default()
        }
        .apply_to(&mut p);

        assert_eq!(p.revenue, Some(2000.0));
        assert_eq!(p.cost_of_goods_sold, Some(300.0));
        assert_eq!(p.notes.as_deref(), Some("revised"));
        // No cascading recalculation of dependent lines
        assert_eq!(p.cash_flow, None);
    }

    #[test]
    fn test_missing_revenue_leaves_derived_lines_absent() {
        let p = FinancialProjection::new(1, PeriodKey::monthly(2025, 1));
        assert_eq!(p.gross_profit(), None);
        assert_eq!(p.net_income(), None);
        assert_eq!(p.months_spanned(), 1);
    }
}
