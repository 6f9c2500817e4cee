//! Incremental graph builder.

use std::collections::{HashMap, HashSet};

use pf_core::{EdgeId, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Edge, Node, PlantGraph, PortDirection, PortRef, PortSpec, TechnologyKind};
use crate::validate;

/// Marker returned by [`GraphBuilder::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    nodes: usize,
    edges: usize,
}

/// Builder for constructing a plant graph incrementally.
///
/// Use `add_node` and `connect` to build up the graph, then call `build()`
/// to validate and freeze it into an immutable `PlantGraph`. Every mutation
/// validates eagerly; a failed call leaves the builder unchanged.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    names: HashMap<String, NodeId>,
}

impl GraphBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its ID.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        kind: TechnologyKind,
        inputs: Vec<PortSpec>,
        outputs: Vec<PortSpec>,
    ) -> GraphResult<NodeId> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(GraphError::DuplicateNode { name });
        }
        check_unique_ports(&name, &inputs, PortDirection::Input)?;
        check_unique_ports(&name, &outputs, PortDirection::Output)?;

        let id = NodeId::from_index(self.nodes.len() as u32);
        self.names.insert(name.clone(), id);
        self.nodes.push(Node {
            id,
            name,
            kind,
            inputs,
            outputs,
        });
        Ok(id)
    }

    /// Look up a node added so far.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Connect an output port to an input port.
    ///
    /// Fails if either port is missing, the units are not convertible, the
    /// shapes are incompatible, or the input already has a producer.
    pub fn connect(
        &mut self,
        source: PortRef,
        dest: PortRef,
        via: Option<NodeId>,
    ) -> GraphResult<EdgeId> {
        validate::validate_edge(&self.nodes, &self.edges, &source, &dest)?;

        let id = EdgeId::from_index(self.edges.len() as u32);
        self.edges.push(Edge {
            id,
            source,
            dest,
            via,
        });
        Ok(id)
    }

    /// Record the current size so a multi-step mutation can be undone.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
        }
    }

    /// Drop every node and edge added after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        for node in self.nodes.drain(checkpoint.nodes.min(self.nodes.len())..) {
            self.names.remove(&node.name);
        }
        self.edges.truncate(checkpoint.edges);
    }

    /// Run `f` and roll back everything it added if it fails.
    pub fn atomically<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let checkpoint = self.checkpoint();
        let result = f(self);
        if result.is_err() {
            self.rollback(checkpoint);
        }
        result
    }

    /// Build and validate the graph, returning an immutable `PlantGraph`.
    pub fn build(self) -> GraphResult<PlantGraph> {
        validate::validate_structure(&self.nodes, &self.edges)?;

        let mut incoming = vec![Vec::new(); self.nodes.len()];
        let mut outgoing = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            incoming[edge.dest.node.slot()].push(edge.id);
            outgoing[edge.source.node.slot()].push(edge.id);
        }

        Ok(PlantGraph {
            nodes: self.nodes,
            edges: self.edges,
            names: self.names,
            incoming,
            outgoing,
        })
    }
}

fn check_unique_ports(node: &str, ports: &[PortSpec], direction: PortDirection) -> GraphResult<()> {
    let mut seen = HashSet::new();
    for port in ports {
        if !seen.insert(port.name.as_str()) {
            return Err(GraphError::DuplicatePort {
                node: node.to_string(),
                port: port.name.clone(),
                direction,
            });
        }
    }
    Ok(())
}
