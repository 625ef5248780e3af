//! Pure aggregation of projections into financial metrics

use super::insights::Advice;
use super::{
    CashFlowMetrics, FinancialMetrics, GrowthMetrics, HealthGrade, MetricsThresholds,
    ProfitabilityMetrics, RevenueMetrics,
};
use crate::projection::FinancialProjection;

/// Calculate metrics with the default thresholds
pub fn calculate(plan_id: i64, projections: &[FinancialProjection]) -> FinancialMetrics {
    calculate_with(plan_id, projections, &MetricsThresholds::default())
}

/// Calculate metrics for a plan's projections.
///
/// Input order does not matter; rows are read in period order.
pub fn calculate_with(
    plan_id: i64,
    projections: &[FinancialProjection],
    thresholds: &MetricsThresholds,
) -> FinancialMetrics {
    let mut rows: Vec<&FinancialProjection> = projections.iter().collect();
    rows.sort_by_key(|row| row.period);

    let revenue = revenue_metrics(&rows);
    let profitability = profitability_metrics(&rows, revenue.total_revenue);
    let cash_flow = cash_flow_metrics(&rows);
    let growth = growth_metrics(&rows, &revenue);

    let health_score = grade(&profitability, &cash_flow, &growth, thresholds);
    let advice = Advice::build(rows.len(), &revenue, &profitability, &cash_flow, &growth, thresholds);

    FinancialMetrics {
        plan_id,
        period_count: rows.len(),
        revenue,
        profitability,
        cash_flow,
        growth,
        health_score,
        insights: advice.insights,
        recommendations: advice.recommendations,
        risk_factors: advice.risk_factors,
    }
}

/// Per-period compound growth between two endpoint values.
///
/// `(last / first)^(1/periods) - 1`, absent unless both values are positive.
pub fn compound_growth(first: Option<f64>, last: Option<f64>, periods: usize) -> Option<f64> {
    match (first, last) {
        (Some(first), Some(last)) if first > 0.0 && last > 0.0 && periods > 0 => {
            Some((last / first).powf(1.0 / periods as f64) - 1.0)
        }
        _ => None,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn revenue_metrics(rows: &[&FinancialProjection]) -> RevenueMetrics {
    let total_revenue: f64 = rows.iter().filter_map(|r| r.revenue).sum();
    let average_period_revenue = (!rows.is_empty()).then(|| total_revenue / rows.len() as f64);

    let revenue_growth_rate = compound_growth(
        rows.first().and_then(|r| r.revenue),
        rows.last().and_then(|r| r.revenue),
        rows.len(),
    );

    let average_revenue_per_customer = rows
        .last()
        .and_then(|r| r.customer_count)
        .filter(|&customers| customers > 0)
        .map(|customers| total_revenue / customers as f64);

    RevenueMetrics {
        total_revenue,
        average_period_revenue,
        revenue_growth_rate,
        average_revenue_per_customer,
    }
}

fn profitability_metrics(rows: &[&FinancialProjection], total_revenue: f64) -> ProfitabilityMetrics {
    let earning: Vec<(&FinancialProjection, f64)> = rows
        .iter()
        .filter_map(|r| r.revenue.filter(|&rev| rev > 0.0).map(|rev| (*r, rev)))
        .collect();

    let gross_margin = mean(
        earning
            .iter()
            .filter_map(|(r, rev)| r.gross_profit().map(|gp| gp / rev)),
    );
    let net_margin = mean(
        earning
            .iter()
            .filter_map(|(r, rev)| r.net_income().map(|ni| ni / rev)),
    );

    let ebitda_values: Vec<f64> = rows.iter().filter_map(|r| r.ebitda()).collect();
    let ebitda = (!ebitda_values.is_empty()).then(|| ebitda_values.iter().sum::<f64>());
    let ebitda_margin = ebitda.filter(|_| total_revenue > 0.0).map(|e| e / total_revenue);

    ProfitabilityMetrics {
        gross_margin,
        net_margin,
        ebitda,
        ebitda_margin,
    }
}

fn cash_flow_metrics(rows: &[&FinancialProjection]) -> CashFlowMetrics {
    let flows: Vec<(f64, u32)> = rows
        .iter()
        .filter_map(|r| r.cash_flow.map(|cf| (cf, r.months_spanned())))
        .collect();

    let total_cash_flow = (!flows.is_empty()).then(|| flows.iter().map(|(cf, _)| cf).sum::<f64>());
    let average_cash_flow = mean(flows.iter().map(|(cf, _)| *cf));

    let average_monthly_burn = mean(
        flows
            .iter()
            .filter(|(cf, _)| *cf < 0.0)
            .map(|(cf, months)| -cf / (*months).max(1) as f64),
    );

    let latest_cash_balance = rows.iter().rev().find_map(|r| r.cash_balance);

    let cash_runway_months = match (latest_cash_balance, average_monthly_burn) {
        (Some(balance), Some(burn)) if burn > 0.0 => Some((balance / burn).max(0.0)),
        _ => None,
    };

    CashFlowMetrics {
        total_cash_flow,
        average_cash_flow,
        average_monthly_burn,
        latest_cash_balance,
        cash_runway_months,
    }
}

fn growth_metrics(rows: &[&FinancialProjection], revenue: &RevenueMetrics) -> GrowthMetrics {
    let customer_growth_rate = compound_growth(
        rows.first().and_then(|r| r.customer_count).map(|c| c as f64),
        rows.last().and_then(|r| r.customer_count).map(|c| c as f64),
        rows.len(),
    );
    let employee_growth_rate = compound_growth(
        rows.first().and_then(|r| r.employee_count).map(|e| e as f64),
        rows.last().and_then(|r| r.employee_count).map(|e| e as f64),
        rows.len(),
    );

    let periods_per_year = rows
        .first()
        .map(|r| r.period.frequency().periods_per_year())
        .unwrap_or(1);
    let annualized_revenue_growth = revenue
        .revenue_growth_rate
        .map(|g| (1.0 + g).powi(periods_per_year as i32) - 1.0);

    let revenue_per_employee = rows
        .last()
        .and_then(|r| r.employee_count)
        .filter(|&employees| employees > 0)
        .map(|employees| revenue.total_revenue / employees as f64);

    GrowthMetrics {
        customer_growth_rate,
        employee_growth_rate,
        annualized_revenue_growth,
        revenue_per_employee,
    }
}

/// Letter grade: one downgrade per missed healthy threshold, one more per
/// breached critical threshold. Undefined runway (no burn) passes; undefined
/// margin or growth counts as missed.
fn grade(
    profitability: &ProfitabilityMetrics,
    cash_flow: &CashFlowMetrics,
    growth: &GrowthMetrics,
    t: &MetricsThresholds,
) -> HealthGrade {
    let mut steps = 0;

    match profitability.net_margin {
        Some(margin) => {
            if margin <= t.healthy_net_margin {
                steps += 1;
            }
            if margin < t.critical_net_margin {
                steps += 1;
            }
        }
        None => steps += 1,
    }

    if let Some(runway) = cash_flow.cash_runway_months {
        if runway <= t.healthy_runway_months {
            steps += 1;
        }
        if runway < t.critical_runway_months {
            steps += 1;
        }
    }

    match growth.annualized_revenue_growth {
        Some(rate) => {
            if rate <= t.healthy_growth_rate {
                steps += 1;
            }
            if rate < t.critical_growth_rate {
                steps += 1;
            }
        }
        None => steps += 1,
    }

    HealthGrade::from_downgrades(steps)
}
