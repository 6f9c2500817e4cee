//! pf-finance: plant-level cost adjustment and price solving.
//!
//! Provides:
//! - Inflation adjustment between cost-basis years
//! - Cash-flow specifications with straight-line or MACRS depreciation
//! - A discounted-cash-flow breakeven price solver behind the `PriceSolver` trait
//! - The financial aggregator node that fans every technology's CapEx/OpEx
//!   into plant totals and a levelized commodity cost

pub mod aggregator;
pub mod cashflow;
pub mod error;
pub mod inflation;
pub mod solver;

pub use aggregator::{
    AGGREGATOR_NAME, AggregatorConfig, FinancialAggregator, TechnologyCost, capex_port, opex_port,
    produced_port,
};
pub use cashflow::{CapitalItem, CashFlowSpec, Depreciation, FixedCost};
pub use error::{FinanceError, FinanceResult};
pub use inflation::{inflation_adjusted, to_cost_year};
pub use solver::{CashFlowRow, DiscountedCashFlowSolver, PriceSolution, PriceSolver};
