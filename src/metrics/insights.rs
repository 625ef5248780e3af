//! Rule-based advisory text triggered by threshold crossings

use super::{CashFlowMetrics, GrowthMetrics, MetricsThresholds, ProfitabilityMetrics, RevenueMetrics};

#[derive(Debug, Default)]
pub(crate) struct Advice {
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
}

impl Advice {
    pub(crate) fn build(
        period_count: usize,
        revenue: &RevenueMetrics,
        profitability: &ProfitabilityMetrics,
        cash_flow: &CashFlowMetrics,
        growth: &GrowthMetrics,
        t: &MetricsThresholds,
    ) -> Self {
        let mut advice = Advice::default();

        if period_count == 0 {
            advice.insights.push("No projections available to analyse".to_string());
            return advice;
        }

        if let Some(margin) = profitability.net_margin {
            if margin < t.critical_net_margin {
                advice.insights.push(format!(
                    "Unprofitable at current scale (net margin {:.1}%)",
                    margin * 100.0
                ));
                advice
                    .recommendations
                    .push("Review pricing and cost structure to reach break-even".to_string());
            } else if margin > t.healthy_net_margin {
                advice
                    .insights
                    .push(format!("Healthy net margin of {:.1}%", margin * 100.0));
            }
        }

        if let Some(gross) = profitability.gross_margin {
            if gross < t.low_gross_margin {
                advice
                    .risk_factors
                    .push(format!("Thin gross margin ({:.1}%)", gross * 100.0));
                advice
                    .recommendations
                    .push("Renegotiate supplier terms or revisit pricing".to_string());
            }
        }

        if let Some(rate) = growth.annualized_revenue_growth {
            if rate > t.healthy_growth_rate {
                advice
                    .insights
                    .push(format!("Revenue growing {:.1}% per year", rate * 100.0));
            } else if rate < t.critical_growth_rate {
                advice.risk_factors.push("Declining revenue".to_string());
                advice
                    .recommendations
                    .push("Investigate demand drivers and sales pipeline".to_string());
            }
        }

        match cash_flow.cash_runway_months {
            Some(runway) if runway < t.critical_runway_months => {
                advice
                    .risk_factors
                    .push(format!("Low cash runway ({runway:.1} months)"));
                advice
                    .recommendations
                    .push("Raise capital or reduce burn immediately".to_string());
            }
            Some(runway) if runway <= t.healthy_runway_months => {
                advice.recommendations.push(format!(
                    "Plan the next financing round ({runway:.1} months of runway)"
                ));
            }
            Some(_) => {}
            None if cash_flow.total_cash_flow.is_some() => {
                advice
                    .insights
                    .push("Cash flow is non-negative in every period".to_string());
            }
            None => {}
        }

        if cash_flow.latest_cash_balance.is_some_and(|balance| balance < 0.0) {
            advice.risk_factors.push("Cash balance turns negative".to_string());
        }

        if growth.customer_growth_rate.is_some_and(|rate| rate < 0.0) {
            advice.risk_factors.push("Customer base shrinking".to_string());
            advice
                .recommendations
                .push("Invest in retention to bring churn below acquisition".to_string());
        }

        if let Some(per_employee) = growth.revenue_per_employee {
            advice
                .insights
                .push(format!("Revenue per employee: {per_employee:.0}"));
        }

        if let Some(arpc) = revenue.average_revenue_per_customer {
            advice
                .insights
                .push(format!("Revenue per customer over the forecast: {arpc:.2}"));
        }

        advice
    }
}
