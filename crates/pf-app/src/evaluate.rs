//! Evaluation substrate: runs an assembled plant in schedule order and moves
//! values along edges.

use std::collections::BTreeMap;

use pf_cache::{CacheOutcome, CacheStore};
use pf_core::Value;
use pf_finance::AGGREGATOR_NAME;
use pf_graph::{GraphError, PortRef};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::plant_compile::Plant;

/// Outputs of every node of one plant evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlantResults {
    order: Vec<String>,
    /// Values delivered to each node's inputs, after unit conversion.
    inputs: BTreeMap<String, BTreeMap<String, Value>>,
    values: BTreeMap<String, BTreeMap<String, Value>>,
    cache_hits: usize,
    cache_misses: usize,
}

impl PlantResults {
    /// Node names in the order they were evaluated.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn node(&self, name: &str) -> Option<&BTreeMap<String, Value>> {
        self.values.get(name)
    }

    pub fn get(&self, node: &str, port: &str) -> Option<&Value> {
        self.values.get(node).and_then(|ports| ports.get(port))
    }

    /// Value a node received on input `port`.
    pub fn input(&self, node: &str, port: &str) -> Option<&Value> {
        self.inputs.get(node).and_then(|ports| ports.get(port))
    }

    pub fn scalar(&self, node: &str, port: &str) -> Option<f64> {
        self.get(node, port).and_then(Value::as_scalar)
    }

    /// Levelized cost of the plant commodity, when one was priced.
    pub fn levelized_cost(&self) -> Option<f64> {
        self.scalar(AGGREGATOR_NAME, "levelized_cost")
    }

    pub fn total_capex(&self) -> Option<f64> {
        self.scalar(AGGREGATOR_NAME, "total_capex_adjusted")
    }

    pub fn total_opex(&self) -> Option<f64> {
        self.scalar(AGGREGATOR_NAME, "total_opex_adjusted")
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses
    }
}

impl Plant {
    /// Value delivered to input `port` of node `id`.
    ///
    /// Connected inputs take the producer's output converted to the input
    /// unit; unconnected inputs take their default.
    fn input_value(
        &self,
        dest: &PortRef,
        produced: &[Option<BTreeMap<String, Value>>],
    ) -> AppResult<Value> {
        let node = self.graph.node(dest.node).ok_or(GraphError::InvalidNodeRef {
            index: dest.node.index(),
        })?;
        let spec = node.input(&dest.port).ok_or_else(|| GraphError::UnknownPort {
            node: node.name.clone(),
            port: dest.port.clone(),
            direction: pf_graph::PortDirection::Input,
        })?;
        let fail = |message: String| AppError::ModelEvaluation {
            node: node.name.clone(),
            message,
        };

        let value = match self.graph.producer(dest) {
            Some(edge) => {
                let source = &edge.source;
                let label = self.graph.port_label(source);
                let raw = produced
                    .get(source.node.slot())
                    .and_then(Option::as_ref)
                    .and_then(|ports| ports.get(&source.port))
                    .ok_or_else(|| fail(format!("{} has not been produced", label)))?;
                let unit = self
                    .graph
                    .node(source.node)
                    .and_then(|n| n.output(&source.port))
                    .map(|p| p.unit)
                    .ok_or_else(|| fail(format!("{} is not an output", label)))?;
                let factor = unit
                    .factor_to(spec.unit)
                    .map_err(|e| fail(format!("{} -> {}: {}", label, dest.port, e)))?;
                raw.scaled(factor)
            }
            None => {
                let default = spec.default.ok_or_else(|| GraphError::UnconnectedInput {
                    node: node.name.clone(),
                    port: spec.name.clone(),
                })?;
                Value::default_for(spec.shape, default)
            }
        };
        value
            .check_shape(spec.shape)
            .map_err(|e| fail(format!("input '{}': {}", spec.name, e)))?;
        Ok(value)
    }

    /// Evaluate every node once, in schedule order.
    ///
    /// The first failing node aborts the run; nothing downstream of it is
    /// evaluated.
    pub fn evaluate(&mut self, cache: Option<&CacheStore>) -> AppResult<PlantResults> {
        let order = self.schedule.order().to_vec();
        let mut produced: Vec<Option<BTreeMap<String, Value>>> = vec![None; self.nodes.len()];
        let mut results = PlantResults::default();

        for id in order {
            let Some(spec) = self.graph.node(id) else {
                return Err(GraphError::InvalidNodeRef { index: id.index() }.into());
            };
            let name = spec.name.clone();
            let mut inputs = BTreeMap::new();
            for port in &spec.inputs {
                let dest = PortRef::new(id, port.name.clone());
                inputs.insert(port.name.clone(), self.input_value(&dest, &produced)?);
            }

            debug!(node = %name, inputs = inputs.len(), "evaluating");
            let node = self
                .nodes
                .get_mut(id.slot())
                .ok_or(GraphError::InvalidNodeRef { index: id.index() })?;
            results.inputs.insert(name.clone(), inputs.clone());
            let outputs = node.evaluate(inputs, cache)?;
            for outcome in &outputs.cache {
                match outcome {
                    CacheOutcome::Hit => results.cache_hits += 1,
                    CacheOutcome::Miss => results.cache_misses += 1,
                }
            }

            results.values.insert(name.clone(), outputs.values.clone());
            produced[id.slot()] = Some(outputs.values);
            results.order.push(name);
        }

        info!(
            nodes = results.order.len(),
            cache_hits = results.cache_hits,
            cache_misses = results.cache_misses,
            "plant evaluated"
        );
        Ok(results)
    }
}
