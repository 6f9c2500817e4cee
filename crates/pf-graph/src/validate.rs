//! Graph validation logic.

use std::collections::HashSet;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Edge, Node, PortDirection, PortRef, PortSpec};

fn node_at<'a>(nodes: &'a [Node], port: &PortRef) -> GraphResult<&'a Node> {
    nodes
        .get(port.node.slot())
        .ok_or(GraphError::InvalidNodeRef {
            index: port.node.index(),
        })
}

fn port_on<'a>(node: &'a Node, name: &str, direction: PortDirection) -> GraphResult<&'a PortSpec> {
    node.port(name, direction)
        .ok_or_else(|| GraphError::UnknownPort {
            node: node.name.clone(),
            port: name.to_string(),
            direction,
        })
}

fn label(node: &Node, port: &str) -> String {
    format!("{}.{}", node.name, port)
}

/// Validate a single prospective edge against the nodes and edges so far.
pub(crate) fn validate_edge(
    nodes: &[Node],
    edges: &[Edge],
    source: &PortRef,
    dest: &PortRef,
) -> GraphResult<()> {
    let src_node = node_at(nodes, source)?;
    let dst_node = node_at(nodes, dest)?;
    let src = port_on(src_node, &source.port, PortDirection::Output)?;
    let dst = port_on(dst_node, &dest.port, PortDirection::Input)?;

    if !src.unit.convertible_to(dst.unit) {
        return Err(GraphError::IncompatibleUnits {
            from_port: label(src_node, &source.port),
            to_port: label(dst_node, &dest.port),
            from: src.unit,
            to: dst.unit,
        });
    }

    if !src.shape.compatible_with(dst.shape) {
        return Err(GraphError::IncompatibleShapes {
            from_port: label(src_node, &source.port),
            to_port: label(dst_node, &dest.port),
            from: src.shape,
            to: dst.shape,
        });
    }

    // Inputs are single-producer.
    if let Some(existing) = edges.iter().find(|e| &e.dest == dest) {
        let existing_node = node_at(nodes, &existing.source)?;
        return Err(GraphError::MultipleProducers {
            port: label(dst_node, &dest.port),
            existing: label(existing_node, &existing.source.port),
            rejected: label(src_node, &source.port),
        });
    }

    Ok(())
}

/// Validate the finished structure: every edge is well-formed, every input
/// has exactly one producer or a default.
pub(crate) fn validate_structure(nodes: &[Node], edges: &[Edge]) -> GraphResult<()> {
    let mut driven: HashSet<&PortRef> = HashSet::new();

    for (i, edge) in edges.iter().enumerate() {
        validate_edge(nodes, &edges[..i], &edge.source, &edge.dest)?;
        driven.insert(&edge.dest);
    }

    for node in nodes {
        for input in &node.inputs {
            let port = PortRef::new(node.id, input.name.clone());
            if input.default.is_none() && !driven.contains(&port) {
                return Err(GraphError::UnconnectedInput {
                    node: node.name.clone(),
                    port: input.name.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TechnologyKind;
    use pf_core::{EdgeId, NodeId, Shape, Unit};

    fn node(index: u32, name: &str, inputs: Vec<PortSpec>, outputs: Vec<PortSpec>) -> Node {
        Node {
            id: NodeId::from_index(index),
            name: name.into(),
            kind: TechnologyKind::Converter,
            inputs,
            outputs,
        }
    }

    #[test]
    fn validate_empty_graph() {
        assert!(validate_structure(&[], &[]).is_ok());
    }

    #[test]
    fn unit_dimension_mismatch() {
        let nodes = vec![
            node(0, "wind", vec![], vec![PortSpec::new("electricity", Unit::Kilowatt, Shape::hourly())]),
            node(1, "tank", vec![PortSpec::new("electricity", Unit::KilogramPerHour, Shape::hourly())], vec![]),
        ];
        let err = validate_edge(
            &nodes,
            &[],
            &PortRef::new(NodeId::from_index(0), "electricity"),
            &PortRef::new(NodeId::from_index(1), "electricity"),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::IncompatibleUnits { .. }));
    }

    #[test]
    fn shape_mismatch() {
        let nodes = vec![
            node(0, "a", vec![], vec![PortSpec::scalar("x", Unit::Kilowatt)]),
            node(1, "b", vec![PortSpec::new("x", Unit::Megawatt, Shape::hourly())], vec![]),
        ];
        let err = validate_edge(
            &nodes,
            &[],
            &PortRef::new(NodeId::from_index(0), "x"),
            &PortRef::new(NodeId::from_index(1), "x"),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::IncompatibleShapes { .. }));
    }

    #[test]
    fn wrong_direction_is_unknown_port() {
        let nodes = vec![
            node(0, "a", vec![PortSpec::scalar("x", Unit::Kilowatt)], vec![]),
            node(1, "b", vec![PortSpec::scalar("x", Unit::Kilowatt)], vec![]),
        ];
        let err = validate_edge(
            &nodes,
            &[],
            &PortRef::new(NodeId::from_index(0), "x"),
            &PortRef::new(NodeId::from_index(1), "x"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnknownPort {
                direction: PortDirection::Output,
                ..
            }
        ));
    }

    #[test]
    fn second_producer_rejected() {
        let nodes = vec![
            node(0, "a", vec![], vec![PortSpec::scalar("x", Unit::Kilowatt)]),
            node(1, "b", vec![], vec![PortSpec::scalar("x", Unit::Kilowatt)]),
            node(2, "c", vec![PortSpec::scalar("x", Unit::Kilowatt)], vec![]),
        ];
        let edges = vec![Edge {
            id: EdgeId::from_index(0),
            source: PortRef::new(NodeId::from_index(0), "x"),
            dest: PortRef::new(NodeId::from_index(2), "x"),
            via: None,
        }];
        let err = validate_edge(
            &nodes,
            &edges,
            &PortRef::new(NodeId::from_index(1), "x"),
            &PortRef::new(NodeId::from_index(2), "x"),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::MultipleProducers { .. }));
    }

    #[test]
    fn unconnected_input_needs_default() {
        let nodes = vec![node(
            0,
            "tank",
            vec![
                PortSpec::scalar("initial_hydrogen", Unit::Kilogram).with_default(0.0),
                PortSpec::new("hydrogen", Unit::KilogramPerHour, Shape::hourly()),
            ],
            vec![],
        )];
        let err = validate_structure(&nodes, &[]).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnconnectedInput {
                node: "tank".into(),
                port: "hydrogen".into()
            }
        );
    }
}
