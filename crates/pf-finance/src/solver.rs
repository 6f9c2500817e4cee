//! Breakeven price solving.

use serde::Serialize;
use tracing::debug;

use crate::cashflow::CashFlowSpec;
use crate::error::{FinanceError, FinanceResult};

/// One year of the solved cash-flow table. Year 0 is construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowRow {
    pub year: u32,
    pub production: f64,
    pub revenue: f64,
    pub capital: f64,
    pub fixed_costs: f64,
    pub depreciation: f64,
    pub taxes: f64,
    pub net_cash_flow: f64,
    pub discounted: f64,
}

/// Solved unit price and the cash flow it produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSolution {
    pub price: f64,
    pub table: Vec<CashFlowRow>,
}

impl PriceSolution {
    /// Net present value of the table; zero at the breakeven price.
    pub fn npv(&self) -> f64 {
        self.table.iter().map(|r| r.discounted).sum()
    }

    pub fn net_cash_flows(&self) -> Vec<f64> {
        self.table.iter().map(|r| r.net_cash_flow).collect()
    }
}

/// Solves for the constant unit price that balances a cash flow.
pub trait PriceSolver: Send + Sync {
    fn solve(&self, spec: &CashFlowSpec) -> FinanceResult<PriceSolution>;
}

/// Discounted-cash-flow breakeven solver.
///
/// Capital is spent in year 0. In each operating year `t` the plant earns
/// `p * Q_t`, pays fixed costs `F_t` and is taxed at `tau` on
/// `p * Q_t - F_t - D_t`. Because every term is linear in `p`, setting the
/// net present value to zero gives the price directly:
///
/// ```text
/// p = [C + sum((1 - tau) F_t - tau D_t) / (1 + r)^t] / sum((1 - tau) Q_t / (1 + r)^t)
/// ```
///
/// Negative taxable income yields a tax credit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountedCashFlowSolver;

impl PriceSolver for DiscountedCashFlowSolver {
    fn solve(&self, spec: &CashFlowSpec) -> FinanceResult<PriceSolution> {
        spec.validate()?;
        let tau = spec.tax_rate;
        let r = spec.discount_rate;
        let capital = spec.total_capital();
        let depreciation = spec.depreciation_schedule()?;

        let mut cost_pv = capital;
        let mut production_pv = 0.0;
        for (i, (q, d)) in spec.production.iter().zip(&depreciation).enumerate() {
            let year = i + 1;
            let factor = (1.0 + r).powi(year as i32);
            let fixed = spec.fixed_costs_in(year);
            cost_pv += ((1.0 - tau) * fixed - tau * d) / factor;
            production_pv += (1.0 - tau) * q / factor;
        }
        if production_pv.abs() < f64::EPSILON {
            return Err(FinanceError::NoProduction);
        }
        let price = cost_pv / production_pv;
        debug!(price, capital, years = spec.lifetime, "solved breakeven price");

        let mut table = Vec::with_capacity(spec.lifetime as usize + 1);
        table.push(CashFlowRow {
            year: 0,
            production: 0.0,
            revenue: 0.0,
            capital,
            fixed_costs: 0.0,
            depreciation: 0.0,
            taxes: 0.0,
            net_cash_flow: -capital,
            discounted: -capital,
        });
        for (i, (q, d)) in spec.production.iter().zip(&depreciation).enumerate() {
            let year = i + 1;
            let revenue = price * q;
            let fixed = spec.fixed_costs_in(year);
            let taxes = tau * (revenue - fixed - d);
            let net = revenue - fixed - taxes;
            table.push(CashFlowRow {
                year: year as u32,
                production: *q,
                revenue,
                capital: 0.0,
                fixed_costs: fixed,
                depreciation: *d,
                taxes,
                net_cash_flow: net,
                discounted: net / (1.0 + r).powi(year as i32),
            });
        }

        Ok(PriceSolution { price, table })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::{CapitalItem, Depreciation, FixedCost};

    fn spec() -> CashFlowSpec {
        CashFlowSpec::new(20, 1_000.0, 0.08, 0.25)
            .with_capital(CapitalItem {
                name: "plant".into(),
                cost: 1.0e6,
                depreciation: Depreciation::Macrs(7),
            })
            .with_fixed_cost(FixedCost {
                name: "om".into(),
                annual: 2.0e4,
                escalation: 0.02,
            })
    }

    #[test]
    fn breakeven_price_zeroes_npv() {
        let solution = DiscountedCashFlowSolver.solve(&spec()).unwrap();
        assert!(solution.price > 0.0);
        assert!(solution.npv().abs() < 1e-6 * 1.0e6);
        assert_eq!(solution.table.len(), 21);
        assert_eq!(solution.table[0].net_cash_flow, -1.0e6);
    }

    #[test]
    fn untaxed_undiscounted_price_is_average_cost() {
        let spec = CashFlowSpec::new(10, 100.0, 0.0, 0.0)
            .with_capital(CapitalItem {
                name: "plant".into(),
                cost: 1000.0,
                depreciation: Depreciation::StraightLine(10),
            })
            .with_fixed_cost(FixedCost {
                name: "om".into(),
                annual: 50.0,
                escalation: 0.0,
            });
        let solution = DiscountedCashFlowSolver.solve(&spec).unwrap();
        // (1000 + 10 * 50) / (10 * 100)
        assert!((solution.price - 1.5).abs() < 1e-12);
    }

    #[test]
    fn zero_production_has_no_price() {
        let spec = CashFlowSpec::new(10, 0.0, 0.05, 0.0);
        assert_eq!(
            DiscountedCashFlowSolver.solve(&spec),
            Err(FinanceError::NoProduction)
        );
    }
}
