//! Connection resolution: interconnection entries to graph edges and
//! transport nodes.

use pf_core::NodeId;
use pf_graph::{GraphBuilder, PortRef, TechnologyKind};
use pf_models::{Capability, ModelContext, ModelKind, PlantParams};
use pf_project::PlantDef;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::node::{NodeBody, TechnologyNode};

/// One parsed interconnection entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source: String,
    pub dest: String,
    pub variable: String,
    /// Transport kind identifier, for four-element entries.
    pub transport: Option<String>,
    /// The configured entry, kept for error reporting.
    raw: Vec<String>,
}

impl Connection {
    /// Parse a `[source, dest, variable]` or
    /// `[source, dest, variable, transport_kind]` entry.
    pub fn parse(entry: &[String]) -> AppResult<Self> {
        let (source, dest, variable, transport) = match entry {
            [s, d, v] => (s, d, v, None),
            [s, d, v, t] => (s, d, v, Some(t.clone())),
            _ => {
                return Err(AppError::invalid_connection(
                    entry,
                    format!("expected 3 or 4 elements, found {}", entry.len()),
                ));
            }
        };
        Ok(Self {
            source: source.clone(),
            dest: dest.clone(),
            variable: variable.clone(),
            transport,
            raw: entry.to_vec(),
        })
    }

    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// Deterministic name of the transport node this entry inserts.
    pub fn transport_name(&self) -> Option<String> {
        self.transport.as_ref().map(|kind| {
            format!("{}_to_{}_{}_{}", self.source, self.dest, self.variable, kind)
        })
    }

    fn invalid(&self, reason: impl ToString) -> AppError {
        AppError::invalid_connection(&self.raw, reason)
    }
}

/// Output port of `node` carrying `variable`.
///
/// A port named after the variable wins; otherwise a node that relays the
/// quantity (such as a combiner) exposes it as `{variable}_output`.
fn source_port(builder: &GraphBuilder, node: NodeId, variable: &str) -> String {
    let relayed = format!("{}_output", variable);
    match builder.node(node) {
        Some(n) if n.output(variable).is_none() && n.output(&relayed).is_some() => relayed,
        _ => variable.to_string(),
    }
}

/// Input port of `node` receiving `variable`.
///
/// A port named after the variable wins; otherwise the first unconnected
/// `{variable}_input{n}` is taken, so repeated entries into a combiner fill
/// its inputs in configuration order.
fn dest_port(builder: &GraphBuilder, node: NodeId, variable: &str) -> String {
    let Some(n) = builder.node(node) else {
        return variable.to_string();
    };
    if n.input(variable).is_some() {
        return variable.to_string();
    }
    (1..)
        .map(|i| format!("{}_input{}", variable, i))
        .take_while(|port| n.input(port).is_some())
        .find(|port| {
            !builder
                .edges()
                .iter()
                .any(|e| e.dest.node == node && e.dest.port == *port)
        })
        .unwrap_or_else(|| variable.to_string())
}

/// Resolve one entry into the builder.
///
/// A direct entry adds one edge. A transport entry adds the transport node
/// and its two edges, all or nothing; the built node is appended to `nodes`
/// only on success, so `nodes` stays aligned with the builder's node ids.
pub fn resolve_connection(
    builder: &mut GraphBuilder,
    nodes: &mut Vec<TechnologyNode>,
    connection: &Connection,
    plant: &PlantDef,
) -> AppResult<()> {
    let source = builder
        .node_id(&connection.source)
        .ok_or_else(|| connection.invalid(format!("unknown technology '{}'", connection.source)))?;
    let dest = builder
        .node_id(&connection.dest)
        .ok_or_else(|| connection.invalid(format!("unknown technology '{}'", connection.dest)))?;
    let variable = connection.variable.as_str();
    let from = source_port(builder, source, variable);
    let to = dest_port(builder, dest, variable);

    let Some(kind_id) = &connection.transport else {
        builder
            .connect(PortRef::new(source, from), PortRef::new(dest, to), None)
            .map_err(|e| connection.invalid(e))?;
        debug!(source = %connection.source, dest = %connection.dest, variable, "direct edge");
        return Ok(());
    };

    let kind: ModelKind = kind_id.parse().map_err(|e| match e {
        pf_models::RegistryError::UnknownModel { model } => AppError::UnknownModel {
            model,
            context: format!("transport of connection {:?}", connection.raw),
        },
        other => connection.invalid(other),
    })?;
    let ctor = kind
        .constructor(Capability::Transport)
        .ok_or_else(|| connection.invalid(format!("'{}' is not a transport model", kind)))?;

    let carried = builder
        .node(source)
        .and_then(|n| n.output(&from))
        .ok_or_else(|| {
            connection.invalid(format!(
                "'{}' has no output '{}'",
                connection.source, from
            ))
        })?
        .unit;
    if let Some(dimension) = kind.carries()
        && carried.dimension() != dimension
    {
        return Err(connection.invalid(format!(
            "{} carries {:?} but '{}' is {} ({:?})",
            kind,
            dimension,
            variable,
            carried,
            carried.dimension()
        )));
    }

    let name = connection
        .transport_name()
        .unwrap_or_else(|| kind.as_str().to_string());
    let loss_fraction = plant
        .transport
        .get(kind.as_str())
        .map_or(0.0, |t| t.loss_fraction);
    let mut details = serde_yaml::Mapping::new();
    details.insert("variable".into(), variable.into());
    details.insert("loss_fraction".into(), loss_fraction.into());
    let ctx = ModelContext::new(
        name.clone(),
        serde_yaml::Value::Mapping(details),
        PlantParams {
            plant_life: plant.plant_life,
            cost_year: plant.cost_year,
        },
    );
    let model = ctor(&ctx).map_err(|e| AppError::config(&name, e))?;
    let transport = TechnologyNode::new(
        name.clone(),
        TechnologyKind::Transport,
        Some(kind),
        NodeBody::Single(model),
    )?;
    let input = format!("{}_input", variable);
    let output = format!("{}_output", variable);

    builder
        .atomically(|b| {
            let id = b.add_node(
                name.clone(),
                TechnologyKind::Transport,
                transport.inputs().to_vec(),
                transport.outputs().to_vec(),
            )?;
            b.connect(PortRef::new(source, from), PortRef::new(id, input), Some(id))?;
            b.connect(PortRef::new(id, output), PortRef::new(dest, to), Some(id))?;
            Ok(id)
        })
        .map_err(|e: pf_graph::GraphError| connection.invalid(e))?;

    debug!(transport = %name, "inserted transport node");
    nodes.push(transport);
    Ok(())
}
