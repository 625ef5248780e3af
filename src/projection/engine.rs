//! Scenario generator: expands assumptions into a per-period forecast

use crate::error::Result;
use crate::period::{build_sequence, period_rate, PeriodKey};
use super::cashflows::FinancialProjection;
use super::request::ScenarioRequest;
use super::state::ScenarioState;

/// Deterministic compounding simulation over one scenario
#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    request: ScenarioRequest,
    periods_per_year: u32,
    months_per_period: u32,
    /// Revenue growth per period
    revenue_rate: f64,
    /// Headcount growth per period
    employee_rate: f64,
}

impl ScenarioGenerator {
    /// Create a generator, rejecting requests that fail [`ScenarioRequest::check`]
    pub fn new(request: ScenarioRequest) -> Result<Self> {
        request.check()?;

        let periods_per_year = request.frequency.periods_per_year();
        Ok(Self {
            periods_per_year,
            months_per_period: request.frequency.months_per_period(),
            revenue_rate: period_rate(request.revenue_growth_rate, periods_per_year),
            employee_rate: period_rate(request.employee_growth_rate, periods_per_year),
            request,
        })
    }

    pub fn request(&self) -> &ScenarioRequest {
        &self.request
    }

    /// Per-period revenue growth rate applied by this generator
    pub fn revenue_rate(&self) -> f64 {
        self.revenue_rate
    }

    /// Period keys this generator will emit
    pub fn periods(&self) -> Vec<PeriodKey> {
        build_sequence(
            self.request.frequency,
            self.request.total_periods(),
            self.request.start_year,
            self.request.start_month,
        )
    }

    /// Generate the full forecast for a plan, ascending by period
    pub fn generate(&self, plan_id: i64) -> Vec<FinancialProjection> {
        let periods = self.periods();
        log::debug!(
            "generating scenario '{}' for plan {}: {} {} periods",
            self.request.name,
            plan_id,
            periods.len(),
            self.request.frequency,
        );

        periods
            .into_iter()
            .scan(ScenarioState::opening(&self.request), |state, period| {
                let (next, projection) = self.project_period(plan_id, *state, period);
                *state = next;
                Some(projection)
            })
            .collect()
    }

    /// Project a single period from the prior state.
    ///
    /// Returns the state to carry into the next period alongside the row.
    pub fn project_period(
        &self,
        plan_id: i64,
        state: ScenarioState,
        period: PeriodKey,
    ) -> (ScenarioState, FinancialProjection) {
        let req = &self.request;
        let index = state.period_index;

        // Period 0 reports the opening drivers; growth applies from period 1
        let customers = if state.is_opening() {
            state.customers
        } else {
            state.grow_customers(req.customer_growth_rate, req.churn_rate, self.months_per_period)
        };
        let employees = if state.is_opening() {
            state.employees
        } else {
            state.grow_employees(self.employee_rate)
        };

        let revenue = self.period_revenue(index, customers) * req.seasonality_factor(period.calendar_month());

        let cogs = revenue * req.cogs_percentage;
        let operating = revenue * req.opex_percentage;
        let marketing = revenue * req.marketing_percentage;

        let headcount = employees.round().max(0.0);
        let payroll = headcount * req.average_salary / self.periods_per_year as f64;
        let burn = req.monthly_burn_rate * self.months_per_period as f64;

        let cash_flow = revenue - (cogs + operating + marketing + payroll) - burn;
        let cash_balance = state.cash_balance + cash_flow;

        let mut projection = FinancialProjection::new(plan_id, period);
        projection.revenue = Some(revenue);
        projection.cost_of_goods_sold = Some(cogs);
        projection.operating_expenses = Some(operating);
        projection.marketing_expenses = Some(marketing);
        projection.administrative_expenses = Some(payroll);
        projection.cash_flow = Some(cash_flow);
        projection.cash_balance = Some(cash_balance);
        projection.growth_rate = Some(self.revenue_rate);

        if req.initial_customers > 0 {
            projection.customer_count = Some(customers);
        }
        if req.initial_employees > 0 {
            projection.employee_count = Some(headcount as u32);
        }
        if req.price_per_unit > 0.0 {
            projection.units_sold = Some((revenue / req.price_per_unit).round().max(0.0) as u64);
        }

        projection.notes = Some(format!(
            "Generated from scenario '{}' ({} period {} of {})",
            req.name,
            req.frequency,
            index + 1,
            req.total_periods(),
        ));
        projection.assumptions = Some(req.assumptions_summary());

        let next = ScenarioState {
            period_index: index + 1,
            customers,
            employees,
            cash_balance,
        };

        (next, projection)
    }

    /// Revenue before seasonality.
    ///
    /// Customer-driven scenarios take the larger of compounded revenue and
    /// customers times revenue per customer.
    fn period_revenue(&self, index: u32, customers: u64) -> f64 {
        let compounded = self.request.initial_revenue * (1.0 + self.revenue_rate).powi(index as i32);

        if self.request.is_customer_driven() {
            compounded.max(customers as f64 * self.request.average_revenue_per_customer)
        } else {
            compounded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::period::Frequency;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn compounding_request() -> ScenarioRequest {
        ScenarioRequest {
            name: "Compounding".to_string(),
            start_year: 2025,
            projection_years: 3,
            frequency: Frequency::Yearly,
            initial_revenue: 100_000.0,
            revenue_growth_rate: 0.20,
            ..Default::default()
        }
    }

    fn saas_request() -> ScenarioRequest {
        ScenarioRequest {
            name: "SaaS".to_string(),
            start_year: 2025,
            projection_years: 2,
            frequency: Frequency::Monthly,
            initial_revenue: 10_000.0,
            revenue_growth_rate: 0.5,
            cogs_percentage: 0.2,
            opex_percentage: 0.3,
            marketing_percentage: 0.1,
            price_per_unit: 100.0,
            initial_customers: 100,
            customer_growth_rate: 0.08,
            churn_rate: 0.02,
            average_revenue_per_customer: 100.0,
            initial_employees: 5,
            employee_growth_rate: 0.4,
            average_salary: 90_000.0,
            initial_cash: 500_000.0,
            monthly_burn_rate: 5_000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_yearly_compounding() {
        let generator = ScenarioGenerator::new(compounding_request()).unwrap();
        let rows = generator.generate(1);

        assert_eq!(rows.len(), 3);
        assert_relative_eq!(rows[0].revenue.unwrap(), 100_000.0, epsilon = 1e-6);
        assert_relative_eq!(rows[1].revenue.unwrap(), 120_000.0, epsilon = 1e-6);
        assert_relative_eq!(rows[2].revenue.unwrap(), 144_000.0, epsilon = 1e-6);
        assert_eq!(rows[1].growth_rate, Some(0.20));
        assert_eq!(rows[2].period, PeriodKey::annual(2027));
    }

    #[test]
    fn test_monthly_compounds_to_annual_multiple() {
        let request = ScenarioRequest {
            frequency: Frequency::Monthly,
            projection_years: 2,
            ..compounding_request()
        };
        let rows = ScenarioGenerator::new(request).unwrap().generate(1);

        assert_eq!(rows.len(), 24);
        let ratio = rows[12].revenue.unwrap() / rows[0].revenue.unwrap();
        assert_relative_eq!(ratio, 1.2, epsilon = 1e-9);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = ScenarioGenerator::new(saas_request()).unwrap();
        let first = generator.generate(9);
        let second = generator.generate(9);
        assert_eq!(first, second);

        let again = ScenarioGenerator::new(saas_request()).unwrap().generate(9);
        for (a, b) in first.iter().zip(&again) {
            assert_eq!(a.revenue.unwrap().to_bits(), b.revenue.unwrap().to_bits());
            assert_eq!(a.cash_balance.unwrap().to_bits(), b.cash_balance.unwrap().to_bits());
        }
    }

    #[test]
    fn test_non_positive_years_yield_empty_sequence() {
        for years in [0, -2] {
            let request = ScenarioRequest { projection_years: years, ..saas_request() };
            assert!(ScenarioGenerator::new(request).unwrap().generate(1).is_empty());
        }
    }

    #[test]
    fn test_churn_above_growth_never_goes_negative() {
        let request = ScenarioRequest {
            projection_years: 10,
            customer_growth_rate: 0.01,
            churn_rate: 0.60,
            employee_growth_rate: -0.9,
            ..saas_request()
        };
        let rows = ScenarioGenerator::new(request).unwrap().generate(1);

        assert_eq!(rows.len(), 120);
        let mut previous = u64::MAX;
        for row in &rows {
            let customers = row.customer_count.unwrap();
            assert!(customers <= previous);
            previous = customers;
            assert!(row.employee_count.is_some());
        }
        assert_eq!(rows.last().unwrap().customer_count, Some(0));
    }

    #[test]
    fn test_customer_driven_revenue_takes_larger_driver() {
        let request = ScenarioRequest {
            initial_revenue: 1_000.0,
            revenue_growth_rate: 0.0,
            ..saas_request()
        };
        let rows = ScenarioGenerator::new(request).unwrap().generate(1);

        // 100 customers * 100 per customer beats 1,000 compounded
        assert_relative_eq!(rows[0].revenue.unwrap(), 10_000.0);
        // Month 2: round(100 * 1.06) = 106 customers
        assert_eq!(rows[1].customer_count, Some(106));
        assert_relative_eq!(rows[1].revenue.unwrap(), 10_600.0);
    }

    #[test]
    fn test_cost_lines_and_cash_flow() {
        let generator = ScenarioGenerator::new(saas_request()).unwrap();
        let rows = generator.generate(1);
        let first = &rows[0];
        let revenue = first.revenue.unwrap();

        assert_relative_eq!(first.cost_of_goods_sold.unwrap(), revenue * 0.2);
        assert_relative_eq!(first.operating_expenses.unwrap(), revenue * 0.3);
        assert_relative_eq!(first.marketing_expenses.unwrap(), revenue * 0.1);

        let payroll = 5.0 * 90_000.0 / 12.0;
        assert_relative_eq!(first.administrative_expenses.unwrap(), payroll);

        let expected_cf = revenue * 0.4 - payroll - 5_000.0;
        assert_abs_diff_eq!(first.cash_flow.unwrap(), expected_cf, epsilon = 1e-9);
        assert_abs_diff_eq!(first.cash_balance.unwrap(), 500_000.0 + expected_cf, epsilon = 1e-9);

        // Cash balance accumulates period cash flows
        let second = &rows[1];
        assert_abs_diff_eq!(
            second.cash_balance.unwrap(),
            first.cash_balance.unwrap() + second.cash_flow.unwrap(),
            epsilon = 1e-9
        );
        assert_eq!(first.units_sold, Some((revenue / 100.0).round() as u64));
    }

    #[test]
    fn test_seasonality_cycles_from_start_month() {
        let factors: Vec<f64> = (1..=12).map(|m| 1.0 + m as f64 / 100.0).collect();
        let plain = ScenarioRequest {
            frequency: Frequency::Monthly,
            projection_years: 1,
            start_month: 11,
            initial_revenue: 1_000.0,
            revenue_growth_rate: 0.1,
            ..Default::default()
        };
        let seasonal = ScenarioRequest {
            seasonality: Some(factors.clone()),
            ..plain.clone()
        };

        let base = ScenarioGenerator::new(plain).unwrap().generate(1);
        let adjusted = ScenarioGenerator::new(seasonal).unwrap().generate(1);

        let expected_months = [11, 12, 1, 2, 3, 4];
        for (i, month) in expected_months.iter().enumerate() {
            assert_eq!(adjusted[i].period.calendar_month(), *month);
            let multiplier = adjusted[i].revenue.unwrap() / base[i].revenue.unwrap();
            assert_relative_eq!(multiplier, factors[*month as usize - 1], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_invalid_seasonality_rejected() {
        let request = ScenarioRequest {
            seasonality: Some(vec![1.0, 1.1]),
            ..saas_request()
        };
        assert!(matches!(
            ScenarioGenerator::new(request),
            Err(EngineError::InvalidSeasonality { len: 2 })
        ));
    }

    #[test]
    fn test_growth_below_minus_one_rejected() {
        for frequency in [Frequency::Yearly, Frequency::Monthly] {
            let request = ScenarioRequest {
                frequency,
                revenue_growth_rate: -1.5,
                ..saas_request()
            };
            assert!(matches!(
                ScenarioGenerator::new(request),
                Err(EngineError::InvalidParameter { parameter, .. }) if parameter == "revenue_growth_rate"
            ));
        }

        let request = ScenarioRequest {
            projection_years: 1_000_000_000,
            ..saas_request()
        };
        assert!(ScenarioGenerator::new(request).is_err());
    }

    #[test]
    fn test_total_collapse_stays_finite() {
        let request = ScenarioRequest {
            frequency: Frequency::Monthly,
            projection_years: 1,
            initial_customers: 0,
            average_revenue_per_customer: 0.0,
            revenue_growth_rate: -1.0,
            ..saas_request()
        };
        let rows = ScenarioGenerator::new(request).unwrap().generate(1);
        assert!(rows
            .iter()
            .all(|p| p.revenue.is_some_and(|r| r.is_finite() && r >= 0.0)));
    }

    #[test]
    fn test_headcount_compounds_per_period() {
        let request = ScenarioRequest {
            frequency: Frequency::Yearly,
            projection_years: 3,
            initial_employees: 10,
            employee_growth_rate: 0.5,
            ..Default::default()
        };
        let rows = ScenarioGenerator::new(request).unwrap().generate(1);
        let counts: Vec<_> = rows.iter().map(|r| r.employee_count.unwrap()).collect();
        assert_eq!(counts, vec![10, 15, 23]);
    }
}
