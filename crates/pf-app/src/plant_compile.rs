//! Compilation of a project into an assembled, scheduled plant.

use pf_finance::{
    AGGREGATOR_NAME, AggregatorConfig, Depreciation, FinancialAggregator, TechnologyCost,
    capex_port, opex_port, produced_port,
};
use pf_graph::{GraphBuilder, PlantGraph, PortRef, Schedule, TechnologyKind, schedule, to_dot};
use pf_models::{
    Capability, FeedstockSource, FeedstockSupply, ModelContext, ModelKind, PlantParams,
    resolve, resolve_optional,
};
use pf_project::{FinanceParameters, PlantDef, Project, TechnologyDef};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::node::{NodeBody, TechnologyNode};
use crate::resolver::{Connection, resolve_connection};

/// An assembled plant: graph, evaluation order and the node models.
///
/// `nodes[i]` holds the models of the graph node with index `i`.
pub struct Plant {
    pub(crate) graph: PlantGraph,
    pub(crate) schedule: Schedule,
    pub(crate) nodes: Vec<TechnologyNode>,
}

impl Plant {
    /// Freeze `builder` and schedule it.
    ///
    /// `nodes` must hold one entry per builder node, in id order. Fails with
    /// `CyclicGraph` when the connections form a loop.
    pub fn assemble(builder: GraphBuilder, nodes: Vec<TechnologyNode>) -> AppResult<Self> {
        if builder.nodes().len() != nodes.len() {
            return Err(AppError::config(
                "plant",
                format!(
                    "{} graph nodes but {} technology nodes",
                    builder.nodes().len(),
                    nodes.len()
                ),
            ));
        }
        if let Some((spec, node)) = builder
            .nodes()
            .iter()
            .zip(&nodes)
            .find(|(spec, node)| spec.name != node.name())
        {
            return Err(AppError::config(
                node.name(),
                format!("graph node {} is '{}'", spec.id.index(), spec.name),
            ));
        }
        let graph = builder.build()?;
        let schedule = schedule(&graph)?;
        Ok(Self {
            graph,
            schedule,
            nodes,
        })
    }

    pub fn graph(&self) -> &PlantGraph {
        &self.graph
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn nodes(&self) -> &[TechnologyNode] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&TechnologyNode> {
        self.graph.node_id(name).and_then(|id| self.nodes.get(id.slot()))
    }

    /// Node names in evaluation order.
    pub fn order(&self) -> Vec<&str> {
        self.schedule.names(&self.graph)
    }

    pub fn has_aggregator(&self) -> bool {
        self.graph.node_id(AGGREGATOR_NAME).is_some()
    }

    /// Graphviz rendering of the assembled graph.
    pub fn to_dot(&self) -> String {
        to_dot(&self.graph)
    }
}

fn plant_params(plant: &PlantDef) -> PlantParams {
    PlantParams {
        plant_life: plant.plant_life,
        cost_year: plant.cost_year,
    }
}

fn feedstock_node(tech: &TechnologyDef) -> AppResult<TechnologyNode> {
    let supplies = tech
        .feedstocks
        .iter()
        .map(|f| {
            let unit = f
                .units
                .parse::<pf_core::Unit>()
                .map_err(|e| AppError::config(&tech.name, format!("feedstock '{}': {}", f.name, e)))?;
            Ok(FeedstockSupply {
                name: f.name.clone(),
                unit,
                rate: f.rate,
                price_per_unit: f.price_per_unit,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    let source =
        FeedstockSource::new(tech.name.clone(), supplies).map_err(|e| AppError::config(&tech.name, e))?;
    TechnologyNode::new(
        tech.name.clone(),
        TechnologyKind::Feedstock,
        None,
        NodeBody::Single(Box::new(source)),
    )
}

/// Build the node for one technology entry.
///
/// The performance model is mandatory. A cost model whose kind lacks the
/// cost capability is skipped with a warning; the financial slot falls back
/// to the cost model's kind and is silently empty when that kind has no
/// financial model. Unknown identifiers fail in every slot.
pub fn instantiate_technology(tech: &TechnologyDef, plant: PlantParams) -> AppResult<TechnologyNode> {
    if tech.is_feedstock() {
        return feedstock_node(tech);
    }
    let performance = tech.performance_model.as_ref().ok_or_else(|| {
        AppError::config(&tech.name, "needs a performance_model or a feedstocks list")
    })?;
    let kind: ModelKind = performance
        .model
        .parse()
        .map_err(|e| AppError::registry(e, &tech.name, "performance_model"))?;
    let ctx = ModelContext::new(tech.name.clone(), tech.details.clone(), plant);

    if let Some(ctor) = kind.constructor(Capability::Composite) {
        for (slot, model) in [("cost_model", &tech.cost_model), ("financial_model", &tech.financial_model)] {
            if let Some(m) = model
                && m.model.trim() != kind.as_str()
            {
                warn!(technology = %tech.name, slot, model = %m.model, "ignored: {} is a composite model", kind);
            }
        }
        let model = ctor(&ctx).map_err(|e| AppError::config(&tech.name, e))?;
        return TechnologyNode::new(
            tech.name.clone(),
            kind.technology_kind(),
            Some(kind),
            NodeBody::Single(model),
        );
    }

    let ctor = resolve(&performance.model, Capability::Performance)
        .map_err(|e| AppError::registry(e, &tech.name, "performance_model"))?;
    let performance = ctor(&ctx).map_err(|e| AppError::config(&tech.name, e))?;

    let cost = match &tech.cost_model {
        Some(m) => resolve_optional(&m.model, Capability::Cost)
            .map_err(|e| AppError::registry(e, &tech.name, "cost_model"))?,
        None => None,
    };
    let cost = match cost {
        Some(ctor) => Some(ctor(&ctx).map_err(|e| AppError::config(&tech.name, e))?),
        None => {
            warn!(technology = %tech.name, "no cost model");
            None
        }
    };

    let (slot, financial_ref) = match (&tech.financial_model, &tech.cost_model) {
        (Some(m), _) => ("financial_model", Some(m)),
        (None, Some(m)) => ("cost_model", Some(m)),
        (None, None) => ("financial_model", None),
    };
    let financial = match financial_ref {
        Some(m) => resolve_optional(&m.model, Capability::Financial)
            .map_err(|e| AppError::registry(e, &tech.name, slot))?,
        None => None,
    };
    let financial = match financial {
        Some(ctor) => Some(ctor(&ctx).map_err(|e| AppError::config(&tech.name, e))?),
        None => {
            debug!(technology = %tech.name, "no financial model");
            None
        }
    };

    TechnologyNode::new(
        tech.name.clone(),
        kind.technology_kind(),
        Some(kind),
        NodeBody::Split {
            performance,
            cost,
            financial,
        },
    )
}

/// Commodity named by a `total_{x}_produced` port.
fn produced_commodity(port: &str) -> Option<&str> {
    port.strip_prefix("total_")
        .and_then(|rest| rest.strip_suffix("_produced"))
        .filter(|c| !c.is_empty())
}

/// Add the financial aggregator and its fan-in edges.
///
/// Every node exposing both `CapEx` and `OpEx` feeds the aggregator. The
/// priced commodity is the configured one, or else the one behind the first
/// `total_{x}_produced` output in configuration order. It is priced only when
/// some node produces `total_{commodity}_produced`; the first such node in
/// configuration order is used.
pub fn attach_aggregator(
    builder: &mut GraphBuilder,
    nodes: &mut Vec<TechnologyNode>,
    finance: &FinanceParameters,
    plant: &PlantDef,
) -> AppResult<()> {
    let costed: Vec<String> = nodes
        .iter()
        .filter(|n| n.has_cost_outputs())
        .map(|n| n.name().to_string())
        .collect();
    let technologies = costed
        .iter()
        .map(|name| TechnologyCost {
            name: name.clone(),
            cost_year: finance
                .discount_years
                .get(name)
                .copied()
                .unwrap_or(plant.cost_year),
        })
        .collect();

    let commodity = match &finance.commodity {
        Some(commodity) => Some(commodity.clone()),
        None => {
            let inferred = nodes
                .iter()
                .find_map(|n| n.outputs().iter().find_map(|p| produced_commodity(&p.name)))
                .map(str::to_string);
            if let Some(commodity) = &inferred {
                info!(commodity = %commodity, "pricing produced commodity");
            }
            inferred
        }
    };

    let mut producer = None;
    if let Some(commodity) = &commodity {
        let port = produced_port(commodity);
        let producers: Vec<&str> = nodes
            .iter()
            .filter(|n| n.output(&port).is_some())
            .map(|n| n.name())
            .collect();
        match producers.as_slice() {
            [] => warn!(commodity = %commodity, "no technology produces {}; levelized cost skipped", port),
            [first, rest @ ..] => {
                if !rest.is_empty() {
                    warn!(commodity = %commodity, using = %first, ignored = ?rest, "several producers of {}", port);
                }
                producer = Some((first.to_string(), port));
            }
        }
    }

    let config = AggregatorConfig {
        plant_cost_year: plant.cost_year,
        inflation_rate: finance.costing_general_inflation,
        plant_life: plant.plant_life,
        commodity: producer.as_ref().and(commodity),
        discount_rate: finance.discount_rate,
        tax_rate: finance.tax_rate,
        depreciation: Depreciation::from_parts(
            &finance.depreciation.method,
            finance.depreciation.period,
        )?,
        fixed_cost_escalation: finance.fixed_cost_escalation,
    };
    let aggregator = TechnologyNode::new(
        AGGREGATOR_NAME,
        TechnologyKind::Financial,
        None,
        NodeBody::Single(Box::new(FinancialAggregator::new(technologies, config))),
    )?;

    builder.atomically(|b| {
        let id = b.add_node(
            AGGREGATOR_NAME,
            TechnologyKind::Financial,
            aggregator.inputs().to_vec(),
            aggregator.outputs().to_vec(),
        )?;
        for name in &costed {
            let tech = b
                .node_id(name)
                .ok_or_else(|| pf_graph::GraphError::UnknownNode { name: name.clone() })?;
            b.connect(PortRef::new(tech, "CapEx"), PortRef::new(id, capex_port(name)), None)?;
            b.connect(PortRef::new(tech, "OpEx"), PortRef::new(id, opex_port(name)), None)?;
        }
        if let Some((name, port)) = &producer {
            let tech = b
                .node_id(name)
                .ok_or_else(|| pf_graph::GraphError::UnknownNode { name: name.clone() })?;
            b.connect(PortRef::new(tech, port.as_str()), PortRef::new(id, port.as_str()), None)?;
        }
        Ok::<_, pf_graph::GraphError>(())
    })?;

    info!(technologies = costed.len(), "attached financial aggregator");
    nodes.push(aggregator);
    Ok(())
}

/// Assemble and schedule `project`.
///
/// Nodes are created in configuration order, then connections are resolved,
/// then the aggregator is attached when the plant has finance parameters.
/// Every structural error surfaces here, before any model runs.
pub fn compile_plant(project: &Project) -> AppResult<Plant> {
    let params = plant_params(&project.plant);
    let mut builder = GraphBuilder::new();
    let mut nodes = Vec::with_capacity(project.technologies.len());

    for tech in &project.technologies {
        let node = instantiate_technology(tech, params)?;
        builder.add_node(
            node.name(),
            node.kind(),
            node.inputs().to_vec(),
            node.outputs().to_vec(),
        )?;
        debug!(technology = %tech.name, stages = ?node.stage_names(), "instantiated");
        nodes.push(node);
    }

    let connections = project
        .plant
        .technology_interconnections
        .iter()
        .map(|entry| Connection::parse(entry))
        .collect::<AppResult<Vec<_>>>()?;
    for connection in &connections {
        resolve_connection(&mut builder, &mut nodes, connection, &project.plant)?;
    }

    if let Some(finance) = &project.plant.finance_parameters {
        attach_aggregator(&mut builder, &mut nodes, finance, &project.plant)?;
    }

    let plant = Plant::assemble(builder, nodes)?;
    info!(
        project = %project.name,
        nodes = plant.graph.nodes().len(),
        edges = plant.graph.edges().len(),
        "compiled plant"
    );
    Ok(plant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_project::ModelRef;

    fn tech(name: &str, perf: &str, cost: Option<&str>, details: &str) -> TechnologyDef {
        TechnologyDef {
            name: name.into(),
            performance_model: Some(ModelRef::new(perf)),
            cost_model: cost.map(ModelRef::new),
            financial_model: None,
            feedstocks: vec![],
            details: serde_yaml::from_str(details).unwrap(),
        }
    }

    #[test]
    fn pem_gets_all_three_stages() {
        let node = instantiate_technology(
            &tech("electrolyzer", "pem_electrolyzer", Some("pem_electrolyzer"), "cluster_size_mw: 10"),
            PlantParams::default(),
        )
        .unwrap();
        assert_eq!(node.stage_names().len(), 3);
        assert!(node.output("LCOH").is_some());
        // CapEx feeds the financial stage inside the node
        assert!(node.inputs().iter().all(|p| p.name != "CapEx"));
    }

    #[test]
    fn wind_plant_has_no_financial_stage() {
        let node = instantiate_technology(
            &tech("wind", "wind_plant", Some("wind_plant"), "{}"),
            PlantParams::default(),
        )
        .unwrap();
        assert_eq!(node.stage_names().len(), 2);
        assert!(node.has_cost_outputs());
    }

    #[test]
    fn unknown_cost_model_is_not_tolerated() {
        let err = instantiate_technology(
            &tech("wind", "wind_plant", Some("wind_plnat"), "{}"),
            PlantParams::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, AppError::UnknownModel { model, .. } if model == "wind_plnat"));
    }

    #[test]
    fn composite_builds_single_node() {
        let node = instantiate_technology(
            &tech("hybrid", "hybrid_plant", None, "wind_capacity_kw: 1000"),
            PlantParams::default(),
        )
        .unwrap();
        assert_eq!(node.stage_names().len(), 1);
        assert_eq!(node.model(), Some(ModelKind::HybridPlant));
    }
}
