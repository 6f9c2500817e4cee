//! pf-core: stable foundation for plantflow.
//!
//! Contains:
//! - ids (compact IDs for graph nodes and edges)
//! - error (shared error types)
//! - units (port unit catalogue backed by uom conversion factors)
//! - shape (scalar / time-series port shapes)
//! - value (numeric payloads carried on ports)

pub mod error;
pub mod ids;
pub mod shape;
pub mod units;
pub mod value;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use shape::{HOURS_PER_YEAR, Shape};
pub use units::{Dimension, Unit};
pub use value::Value;
