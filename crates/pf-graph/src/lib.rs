//! pf-graph: plant graph layer for plantflow.
//!
//! Provides:
//! - Core graph data structures (Node, PortSpec, PortRef, Edge, PlantGraph)
//! - Incremental graph builder with validation and rollback checkpoints
//! - Deterministic topological scheduling with cycle reporting
//! - DOT export for diagrams
//!
//! # Example
//!
//! ```
//! use pf_core::{Shape, Unit};
//! use pf_graph::{GraphBuilder, PortRef, PortSpec, TechnologyKind, schedule};
//!
//! let mut builder = GraphBuilder::new();
//! let wind = builder
//!     .add_node(
//!         "wind",
//!         TechnologyKind::Converter,
//!         vec![],
//!         vec![PortSpec::new("electricity", Unit::Kilowatt, Shape::hourly())],
//!     )
//!     .unwrap();
//! let elec = builder
//!     .add_node(
//!         "electrolyzer",
//!         TechnologyKind::Converter,
//!         vec![PortSpec::new("electricity", Unit::Kilowatt, Shape::hourly())],
//!         vec![],
//!     )
//!     .unwrap();
//! builder
//!     .connect(PortRef::new(wind, "electricity"), PortRef::new(elec, "electricity"), None)
//!     .unwrap();
//! let graph = builder.build().unwrap();
//! let order = schedule(&graph).unwrap();
//!
//! assert_eq!(order.names(&graph), vec!["wind", "electrolyzer"]);
//! ```

pub mod builder;
pub mod dot;
pub mod error;
pub mod graph;
pub mod schedule;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::{Checkpoint, GraphBuilder};
pub use dot::to_dot;
pub use error::{GraphError, GraphResult};
pub use graph::{Edge, Node, PlantGraph, PortDirection, PortRef, PortSpec, TechnologyKind};
pub use schedule::{Schedule, schedule};
