//! Core graph data structures.

use std::collections::HashMap;
use std::fmt;

use pf_core::{EdgeId, NodeId, Shape, Unit};

/// Role a node plays in the plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TechnologyKind {
    Converter,
    Storage,
    Transport,
    Feedstock,
    Financial,
}

impl TechnologyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TechnologyKind::Converter => "converter",
            TechnologyKind::Storage => "storage",
            TechnologyKind::Transport => "transport",
            TechnologyKind::Feedstock => "feedstock",
            TechnologyKind::Financial => "financial",
        }
    }
}

impl fmt::Display for TechnologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a port relative to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

/// Declaration of one named, unit-typed, shape-typed port.
#[derive(Debug, Clone, PartialEq)]
pub struct PortSpec {
    pub name: String,
    pub unit: Unit,
    pub shape: Shape,
    /// Value used when an input is left unconnected.
    pub default: Option<f64>,
}

impl PortSpec {
    pub fn new(name: impl Into<String>, unit: Unit, shape: Shape) -> Self {
        Self {
            name: name.into(),
            unit,
            shape,
            default: None,
        }
    }

    pub fn scalar(name: impl Into<String>, unit: Unit) -> Self {
        Self::new(name, unit, Shape::Scalar)
    }

    pub fn with_default(mut self, value: f64) -> Self {
        self.default = Some(value);
        self
    }
}

/// A node in the plant graph: one technology, transport link, feedstock or
/// the financial aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: TechnologyKind,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
}

impl Node {
    pub fn input(&self, name: &str) -> Option<&PortSpec> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&PortSpec> {
        self.outputs.iter().find(|p| p.name == name)
    }

    pub fn port(&self, name: &str, direction: PortDirection) -> Option<&PortSpec> {
        match direction {
            PortDirection::Input => self.input(name),
            PortDirection::Output => self.output(name),
        }
    }
}

/// Address of a port: owning node plus variable name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub node: NodeId,
    pub port: String,
}

impl PortRef {
    pub fn new(node: NodeId, port: impl Into<String>) -> Self {
        Self {
            node,
            port: port.into(),
        }
    }
}

/// Directed dataflow edge from an output port to an input port.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: PortRef,
    pub dest: PortRef,
    /// Transport node this edge is one leg of, if any.
    pub via: Option<NodeId>,
}

/// The plant graph: a validated, immutable collection of nodes and edges.
///
/// Nodes are stored in insertion (configuration) order; `NodeId` indices
/// are positions in that order.
#[derive(Debug, Clone)]
pub struct PlantGraph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) names: HashMap<String, NodeId>,
    /// For each node, the edges ending at it.
    pub(crate) incoming: Vec<Vec<EdgeId>>,
    /// For each node, the edges starting at it.
    pub(crate) outgoing: Vec<Vec<EdgeId>>,
}

impl PlantGraph {
    /// Return all nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return all edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Get a node by ID (returns None if ID out of bounds).
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    /// Get an edge by ID.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.slot())
    }

    /// Look up a node by name.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.node_id(name).and_then(|id| self.node(id))
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        self.node(id).map_or("<unknown>", |n| n.name.as_str())
    }

    /// Edges ending at `id`.
    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming
            .get(id.slot())
            .into_iter()
            .flatten()
            .filter_map(|e| self.edge(*e))
    }

    /// Edges starting at `id`.
    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.outgoing
            .get(id.slot())
            .into_iter()
            .flatten()
            .filter_map(|e| self.edge(*e))
    }

    /// The edge that feeds `dest`, if the input is connected.
    pub fn producer(&self, dest: &PortRef) -> Option<&Edge> {
        self.incoming(dest.node).find(|e| e.dest.port == dest.port)
    }

    /// Transport nodes inserted on connections.
    pub fn transport_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes
            .iter()
            .filter(|n| n.kind == TechnologyKind::Transport)
    }

    /// Human-readable `node.port` label.
    pub fn port_label(&self, port: &PortRef) -> String {
        format!("{}.{}", self.node_name(port.node), port.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_lookup_by_direction() {
        let node = Node {
            id: NodeId::from_index(0),
            name: "tank".into(),
            kind: TechnologyKind::Storage,
            inputs: vec![PortSpec::new("hydrogen", Unit::KilogramPerHour, Shape::hourly())],
            outputs: vec![PortSpec::new("stored_hydrogen", Unit::Kilogram, Shape::hourly())],
        };
        assert!(node.port("hydrogen", PortDirection::Input).is_some());
        assert!(node.port("hydrogen", PortDirection::Output).is_none());
        assert!(node.output("stored_hydrogen").is_some());
    }

    #[test]
    fn default_builder() {
        let spec = PortSpec::scalar("initial_hydrogen", Unit::Kilogram).with_default(0.0);
        assert_eq!(spec.default, Some(0.0));
        assert_eq!(spec.shape, Shape::Scalar);
    }
}
