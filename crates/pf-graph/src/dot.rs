//! Graphviz DOT export of an assembled plant graph.

use std::fmt::Write;

use crate::graph::{PlantGraph, TechnologyKind};

fn shape_for(kind: TechnologyKind) -> &'static str {
    match kind {
        TechnologyKind::Converter => "box",
        TechnologyKind::Storage => "cylinder",
        TechnologyKind::Transport => "cds",
        TechnologyKind::Feedstock => "invhouse",
        TechnologyKind::Financial => "note",
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render the graph as a DOT digraph.
///
/// Nodes appear in configuration order; each edge is labelled with its
/// source and destination port names. Legs of a transport connection are
/// drawn dashed.
pub fn to_dot(graph: &PlantGraph) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph plant {{");
    let _ = writeln!(out, "  rankdir=LR;");

    for node in graph.nodes() {
        let _ = writeln!(
            out,
            "  \"{}\" [shape={}, label=\"{}\\n({})\"];",
            escape(&node.name),
            shape_for(node.kind),
            escape(&node.name),
            node.kind
        );
    }

    for edge in graph.edges() {
        let label = if edge.source.port == edge.dest.port {
            escape(&edge.source.port)
        } else {
            format!("{} -> {}", escape(&edge.source.port), escape(&edge.dest.port))
        };
        let style = if edge.via.is_some() { ", style=dashed" } else { "" };
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [label=\"{}\"{}];",
            escape(graph.node_name(edge.source.node)),
            escape(graph.node_name(edge.dest.node)),
            label,
            style
        );
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::graph::{PortRef, PortSpec};
    use pf_core::{Shape, Unit};

    #[test]
    fn renders_nodes_and_transport_legs() {
        let mut builder = GraphBuilder::new();
        let power = |n: &str| PortSpec::new(n, Unit::Kilowatt, Shape::hourly());
        let wind = builder
            .add_node("wind", TechnologyKind::Converter, vec![], vec![power("electricity")])
            .unwrap();
        let cable = builder
            .add_node(
                "wind_to_electrolyzer_electricity_cable",
                TechnologyKind::Transport,
                vec![power("electricity_input")],
                vec![power("electricity_output")],
            )
            .unwrap();
        let elec = builder
            .add_node(
                "electrolyzer",
                TechnologyKind::Converter,
                vec![power("electricity")],
                vec![],
            )
            .unwrap();
        builder
            .connect(
                PortRef::new(wind, "electricity"),
                PortRef::new(cable, "electricity_input"),
                Some(cable),
            )
            .unwrap();
        builder
            .connect(
                PortRef::new(cable, "electricity_output"),
                PortRef::new(elec, "electricity"),
                Some(cable),
            )
            .unwrap();
        let graph = builder.build().unwrap();

        let dot = to_dot(&graph);
        assert!(dot.starts_with("digraph plant {"));
        assert!(dot.contains("\"wind\" [shape=box"));
        assert!(dot.contains("shape=cds"));
        assert!(dot.contains(
            "\"wind\" -> \"wind_to_electrolyzer_electricity_cable\" [label=\"electricity -> electricity_input\", style=dashed];"
        ));
        assert!(dot.trim_end().ends_with('}'));
    }
}
