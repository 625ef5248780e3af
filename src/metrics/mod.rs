//! Derived financial metrics over a plan's stored projections
//!
//! Every metric whose denominator is zero, or whose inputs are missing, is
//! `None`. Callers must read `None` as "cannot be computed", never as zero.

mod calculator;
mod insights;
mod thresholds;

pub use calculator::{calculate, calculate_with, compound_growth};
pub use thresholds::MetricsThresholds;

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueMetrics {
    pub total_revenue: f64,
    pub average_period_revenue: Option<f64>,
    /// Per-period compound growth, first to last period
    pub revenue_growth_rate: Option<f64>,
    /// Total revenue over the final period's customer count
    pub average_revenue_per_customer: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityMetrics {
    /// Mean over periods with positive revenue
    pub gross_margin: Option<f64>,
    /// Mean over periods with positive revenue
    pub net_margin: Option<f64>,
    pub ebitda: Option<f64>,
    pub ebitda_margin: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowMetrics {
    pub total_cash_flow: Option<f64>,
    pub average_cash_flow: Option<f64>,
    /// Mean monthly-equivalent burn over periods with negative cash flow
    pub average_monthly_burn: Option<f64>,
    pub latest_cash_balance: Option<f64>,
    /// Absent when no period burns cash
    pub cash_runway_months: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthMetrics {
    pub customer_growth_rate: Option<f64>,
    pub employee_growth_rate: Option<f64>,
    /// Revenue growth converted to an annual rate
    pub annualized_revenue_growth: Option<f64>,
    pub revenue_per_employee: Option<f64>,
}

/// Letter grade summarising financial soundness
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthGrade {
    A,
    B,
    C,
    D,
    F,
}

impl HealthGrade {
    /// Grade after `steps` downgrades from A
    pub fn from_downgrades(steps: u32) -> Self {
        match steps {
            0 => HealthGrade::A,
            1 => HealthGrade::B,
            2 => HealthGrade::C,
            3 => HealthGrade::D,
            _ => HealthGrade::F,
        }
    }
}

impl fmt::Display for HealthGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            HealthGrade::A => "A",
            HealthGrade::B => "B",
            HealthGrade::C => "C",
            HealthGrade::D => "D",
            HealthGrade::F => "F",
        };
        f.write_str(letter)
    }
}

/// Snapshot of derived metrics for one plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub plan_id: i64,
    pub period_count: usize,
    pub revenue: RevenueMetrics,
    pub profitability: ProfitabilityMetrics,
    pub cash_flow: CashFlowMetrics,
    pub growth: GrowthMetrics,
    pub health_score: HealthGrade,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
}
