//! Error types for cost adjustment and price solving.

use thiserror::Error;

/// Errors that can occur while building or solving a cash flow.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FinanceError {
    #[error("Invalid financial parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Unsupported depreciation: {what}")]
    Depreciation { what: String },

    #[error("Production profile has {found} years, expected {expected}")]
    ProductionLength { expected: usize, found: usize },

    #[error("Discounted production is zero; no unit price balances the cash flow")]
    NoProduction,
}

pub type FinanceResult<T> = Result<T, FinanceError>;
