//! Graph-specific error types.

use pf_core::{Shape, Unit};
use thiserror::Error;

use crate::graph::PortDirection;

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction, validation and scheduling errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Two nodes share a name.
    #[error("Duplicate node name: '{name}'")]
    DuplicateNode { name: String },

    /// A node declares the same port twice in one direction.
    #[error("Node '{node}' declares {direction} port '{port}' more than once")]
    DuplicatePort {
        node: String,
        port: String,
        direction: PortDirection,
    },

    /// A name lookup found no node.
    #[error("Unknown node: '{name}'")]
    UnknownNode { name: String },

    /// A node ID is outside the graph.
    #[error("Node id {index} does not exist")]
    InvalidNodeRef { index: u32 },

    /// The named port does not exist in the requested direction.
    #[error("Node '{node}' has no {direction} port '{port}'")]
    UnknownPort {
        node: String,
        port: String,
        direction: PortDirection,
    },

    /// Units on both ends of an edge have different dimensions.
    #[error("Cannot connect {from_port} [{from}] to {to_port} [{to}]: units are not convertible")]
    IncompatibleUnits {
        from_port: String,
        to_port: String,
        from: Unit,
        to: Unit,
    },

    /// Shapes on both ends of an edge do not match.
    #[error("Cannot connect {from_port} ({from}) to {to_port} ({to}): shapes are incompatible")]
    IncompatibleShapes {
        from_port: String,
        to_port: String,
        from: Shape,
        to: Shape,
    },

    /// An input port already has a producer.
    #[error("Input {port} is already driven by {existing}; refusing second producer {rejected}")]
    MultipleProducers {
        port: String,
        existing: String,
        rejected: String,
    },

    /// An input port has neither a producer nor a default.
    #[error("Input {node}.{port} is not connected and has no default")]
    UnconnectedInput { node: String, port: String },

    /// The dependency graph contains a cycle.
    #[error("Cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicGraph { cycle: Vec<String> },
}
