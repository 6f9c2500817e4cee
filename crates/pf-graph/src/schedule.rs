//! Topological scheduling of the plant graph.
//!
//! Nodes are ordered so that every edge's producer precedes its consumer.
//! Among nodes that are ready at the same time, the one added to the graph
//! first wins, which makes the order reproducible run over run.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use pf_core::NodeId;

use crate::error::{GraphError, GraphResult};
use crate::graph::PlantGraph;

/// A linear evaluation order over the nodes of one plant graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    order: Vec<NodeId>,
}

impl Schedule {
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Position of `id` in the order.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|n| *n == id)
    }

    /// Node names in evaluation order.
    pub fn names<'g>(&self, graph: &'g PlantGraph) -> Vec<&'g str> {
        self.order.iter().map(|id| graph.node_name(*id)).collect()
    }
}

/// Node-level dependency graph; node index `i` is `NodeId::from_index(i)`.
fn dependency_graph(graph: &PlantGraph) -> DiGraph<NodeId, ()> {
    let mut deps = DiGraph::with_capacity(graph.nodes().len(), graph.edges().len());
    for node in graph.nodes() {
        deps.add_node(node.id);
    }
    for edge in graph.edges() {
        deps.update_edge(
            NodeIndex::new(edge.source.node.slot()),
            NodeIndex::new(edge.dest.node.slot()),
            (),
        );
    }
    deps
}

/// Compute a deterministic evaluation order.
///
/// Fails with [`GraphError::CyclicGraph`] naming one offending cycle.
pub fn schedule(graph: &PlantGraph) -> GraphResult<Schedule> {
    let deps = dependency_graph(graph);

    let mut in_degree: Vec<usize> = deps
        .node_indices()
        .map(|n| deps.neighbors_directed(n, Direction::Incoming).count())
        .collect();

    // Kahn's algorithm; the min-heap breaks ties by insertion order.
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, deg)| **deg == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(in_degree.len());
    while let Some(Reverse(i)) = ready.pop() {
        order.push(deps[NodeIndex::new(i)]);
        for next in deps.neighbors_directed(NodeIndex::new(i), Direction::Outgoing) {
            let deg = &mut in_degree[next.index()];
            *deg -= 1;
            if *deg == 0 {
                ready.push(Reverse(next.index()));
            }
        }
    }

    if order.len() != graph.nodes().len() {
        let cycle = find_cycle(&deps)
            .into_iter()
            .map(|id| graph.node_name(id).to_string())
            .collect();
        return Err(GraphError::CyclicGraph { cycle });
    }

    debug!(nodes = order.len(), "computed evaluation order");
    Ok(Schedule { order })
}

/// Extract one concrete cycle, closed by repeating its first node.
fn find_cycle(deps: &DiGraph<NodeId, ()>) -> Vec<NodeId> {
    let component = tarjan_scc(deps).into_iter().find(|scc| {
        scc.len() > 1 || deps.find_edge(scc[0], scc[0]).is_some()
    });
    let Some(component) = component else {
        return Vec::new();
    };

    let members: HashSet<NodeIndex> = component.iter().copied().collect();
    let start = component
        .iter()
        .copied()
        .min_by_key(|n| n.index())
        .unwrap_or(component[0]);

    // Shortest path start -> ... -> start inside the component.
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    let mut closing = None;
    'search: while let Some(current) = queue.pop_front() {
        let mut successors: Vec<NodeIndex> = deps
            .neighbors_directed(current, Direction::Outgoing)
            .filter(|n| members.contains(n))
            .collect();
        successors.sort_by_key(|n| n.index());
        for next in successors {
            if next == start {
                closing = Some(current);
                break 'search;
            }
            if !parent.contains_key(&next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    let Some(mut cursor) = closing else {
        return vec![deps[start]];
    };
    let mut path = vec![deps[start]];
    let mut tail = Vec::new();
    while cursor != start {
        tail.push(deps[cursor]);
        match parent.get(&cursor) {
            Some(p) => cursor = *p,
            None => break,
        }
    }
    tail.reverse();
    path.extend(tail);
    path.push(deps[start]);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::graph::{PortRef, PortSpec, TechnologyKind};
    use pf_core::{Shape, Unit};

    fn link_node(builder: &mut GraphBuilder, name: &str) -> NodeId {
        builder
            .add_node(
                name,
                TechnologyKind::Converter,
                vec![
                    PortSpec::new("in_a", Unit::Kilowatt, Shape::Dynamic).with_default(0.0),
                    PortSpec::new("in_b", Unit::Kilowatt, Shape::Dynamic).with_default(0.0),
                ],
                vec![PortSpec::new("out", Unit::Kilowatt, Shape::Dynamic)],
            )
            .unwrap()
    }

    fn link(builder: &mut GraphBuilder, from: NodeId, to: NodeId, port: &str) {
        builder
            .connect(PortRef::new(from, "out"), PortRef::new(to, port), None)
            .unwrap();
    }

    #[test]
    fn independent_nodes_keep_insertion_order() {
        let mut builder = GraphBuilder::new();
        for name in ["c", "a", "b"] {
            link_node(&mut builder, name);
        }
        let graph = builder.build().unwrap();
        let order = schedule(&graph).unwrap();
        assert_eq!(order.names(&graph), vec!["c", "a", "b"]);
    }

    #[test]
    fn dependencies_override_insertion_order() {
        let mut builder = GraphBuilder::new();
        let electrolyzer = link_node(&mut builder, "electrolyzer");
        let wind = link_node(&mut builder, "wind");
        link(&mut builder, wind, electrolyzer, "in_a");
        let graph = builder.build().unwrap();

        let order = schedule(&graph).unwrap();
        assert_eq!(order.names(&graph), vec!["wind", "electrolyzer"]);
        assert_eq!(order.position(wind), Some(0));
    }

    #[test]
    fn cycle_is_reported() {
        let mut builder = GraphBuilder::new();
        let a = link_node(&mut builder, "a");
        let b = link_node(&mut builder, "b");
        let c = link_node(&mut builder, "c");
        let d = link_node(&mut builder, "d");
        link(&mut builder, a, b, "in_a");
        link(&mut builder, b, c, "in_a");
        link(&mut builder, c, b, "in_b");
        link(&mut builder, c, d, "in_a");
        let graph = builder.build().unwrap();

        let err = schedule(&graph).unwrap_err();
        assert_eq!(
            err,
            GraphError::CyclicGraph {
                cycle: vec!["b".into(), "c".into(), "b".into()]
            }
        );
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut builder = GraphBuilder::new();
        let a = link_node(&mut builder, "a");
        link(&mut builder, a, a, "in_a");
        let graph = builder.build().unwrap();

        let err = schedule(&graph).unwrap_err();
        assert_eq!(
            err,
            GraphError::CyclicGraph {
                cycle: vec!["a".into(), "a".into()]
            }
        );
    }
}
