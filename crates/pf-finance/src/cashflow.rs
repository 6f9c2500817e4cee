//! Cash-flow specification handed to a price solver.

use serde::{Deserialize, Serialize};

use crate::error::{FinanceError, FinanceResult};

/// MACRS half-year convention rates, in percent, by recovery period.
const MACRS_3: [f64; 4] = [33.33, 44.45, 14.81, 7.41];
const MACRS_5: [f64; 6] = [20.00, 32.00, 19.20, 11.52, 11.52, 5.76];
const MACRS_7: [f64; 8] = [14.29, 24.49, 17.49, 12.49, 8.93, 8.92, 8.93, 4.46];
const MACRS_10: [f64; 11] = [
    10.00, 18.00, 14.40, 11.52, 9.22, 7.37, 6.55, 6.55, 6.56, 6.55, 3.28,
];
const MACRS_15: [f64; 16] = [
    5.00, 9.50, 8.55, 7.70, 6.93, 6.23, 5.90, 5.90, 5.91, 5.90, 5.91, 5.90, 5.91, 5.90, 5.91,
    2.95,
];
const MACRS_20: [f64; 21] = [
    3.750, 7.219, 6.677, 6.177, 5.713, 5.285, 4.888, 4.522, 4.462, 4.461, 4.462, 4.461, 4.462,
    4.461, 4.462, 4.461, 4.462, 4.461, 4.462, 4.461, 2.231,
];

/// How a capital item is written off for tax purposes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "years", rename_all = "snake_case")]
pub enum Depreciation {
    /// Equal write-off over `years`.
    StraightLine(u32),
    /// Modified accelerated cost recovery over a 3, 5, 7, 10, 15 or 20 year class.
    Macrs(u32),
}

impl Depreciation {
    /// Build from a configured method name and recovery period.
    pub fn from_parts(method: &str, years: u32) -> FinanceResult<Self> {
        let dep = match method.trim().to_ascii_lowercase().as_str() {
            "straight_line" | "straight-line" | "sl" => Depreciation::StraightLine(years),
            "macrs" => Depreciation::Macrs(years),
            other => {
                return Err(FinanceError::Depreciation {
                    what: format!("unknown method '{}'", other),
                });
            }
        };
        dep.fractions()?;
        Ok(dep)
    }

    /// Fraction of the cost written off in each year, starting at year 1.
    pub fn fractions(self) -> FinanceResult<Vec<f64>> {
        match self {
            Depreciation::StraightLine(0) => Err(FinanceError::Depreciation {
                what: "straight-line period must be at least one year".to_string(),
            }),
            Depreciation::StraightLine(n) => Ok(vec![1.0 / f64::from(n); n as usize]),
            Depreciation::Macrs(n) => {
                let table: &[f64] = match n {
                    3 => &MACRS_3,
                    5 => &MACRS_5,
                    7 => &MACRS_7,
                    10 => &MACRS_10,
                    15 => &MACRS_15,
                    20 => &MACRS_20,
                    _ => {
                        return Err(FinanceError::Depreciation {
                            what: format!("no MACRS table for a {}-year class", n),
                        });
                    }
                };
                Ok(table.iter().map(|pct| pct / 100.0).collect())
            }
        }
    }
}

impl Default for Depreciation {
    fn default() -> Self {
        Depreciation::Macrs(7)
    }
}

/// An up-front capital cost, spent in year 0.
#[derive(Debug, Clone, PartialEq)]
pub struct CapitalItem {
    pub name: String,
    pub cost: f64,
    pub depreciation: Depreciation,
}

/// A recurring yearly cost that grows at `escalation` per year.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedCost {
    pub name: String,
    /// Cost in the first operating year.
    pub annual: f64,
    pub escalation: f64,
}

impl FixedCost {
    /// Cost incurred in operating year `year` (1-based).
    pub fn in_year(&self, year: usize) -> f64 {
        self.annual * (1.0 + self.escalation).powi(year.saturating_sub(1) as i32)
    }
}

/// Complete cash-flow description of one plant.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowSpec {
    pub capital_items: Vec<CapitalItem>,
    pub fixed_costs: Vec<FixedCost>,
    /// Commodity sold in each operating year; one entry per year of `lifetime`.
    pub production: Vec<f64>,
    pub discount_rate: f64,
    pub tax_rate: f64,
    /// Operating years.
    pub lifetime: u32,
}

impl CashFlowSpec {
    /// Spec with a constant yearly production and no costs yet.
    pub fn new(lifetime: u32, annual_production: f64, discount_rate: f64, tax_rate: f64) -> Self {
        Self {
            capital_items: Vec::new(),
            fixed_costs: Vec::new(),
            production: vec![annual_production; lifetime as usize],
            discount_rate,
            tax_rate,
            lifetime,
        }
    }

    pub fn with_capital(mut self, item: CapitalItem) -> Self {
        self.capital_items.push(item);
        self
    }

    pub fn with_fixed_cost(mut self, cost: FixedCost) -> Self {
        self.fixed_costs.push(cost);
        self
    }

    pub fn total_capital(&self) -> f64 {
        self.capital_items.iter().map(|c| c.cost).sum()
    }

    /// Fixed costs in operating year `year` (1-based).
    pub fn fixed_costs_in(&self, year: usize) -> f64 {
        self.fixed_costs.iter().map(|f| f.in_year(year)).sum()
    }

    /// Depreciation per operating year, truncated to the plant lifetime.
    pub fn depreciation_schedule(&self) -> FinanceResult<Vec<f64>> {
        let mut schedule = vec![0.0; self.lifetime as usize];
        for item in &self.capital_items {
            for (slot, frac) in schedule.iter_mut().zip(item.depreciation.fractions()?) {
                *slot += item.cost * frac;
            }
        }
        Ok(schedule)
    }

    pub fn validate(&self) -> FinanceResult<()> {
        if self.lifetime == 0 {
            return Err(FinanceError::InvalidParameter {
                name: "lifetime",
                value: 0.0,
            });
        }
        if !self.discount_rate.is_finite() || self.discount_rate <= -1.0 {
            return Err(FinanceError::InvalidParameter {
                name: "discount_rate",
                value: self.discount_rate,
            });
        }
        if !(0.0..1.0).contains(&self.tax_rate) {
            return Err(FinanceError::InvalidParameter {
                name: "tax_rate",
                value: self.tax_rate,
            });
        }
        if self.production.len() != self.lifetime as usize {
            return Err(FinanceError::ProductionLength {
                expected: self.lifetime as usize,
                found: self.production.len(),
            });
        }
        let finite = self.capital_items.iter().all(|c| c.cost.is_finite())
            && self
                .fixed_costs
                .iter()
                .all(|f| f.annual.is_finite() && f.escalation.is_finite())
            && self.production.iter().all(|q| q.is_finite());
        if !finite {
            return Err(FinanceError::InvalidParameter {
                name: "cash flow entry",
                value: f64::NAN,
            });
        }
        Ok(())
    }
}
