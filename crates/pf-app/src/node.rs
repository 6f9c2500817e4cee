//! Technology nodes: one or more sub-models behind a shared port namespace.

use std::collections::BTreeMap;

use pf_cache::{CacheOutcome, CacheStore, compute_cache_key};
use pf_core::{Unit, Value};
use pf_graph::{GraphError, PortDirection, PortSpec, TechnologyKind};
use pf_models::{ModelError, ModelKind, PortValues, SubModel};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Sub-models owned by a node.
pub enum NodeBody {
    /// A technology split into performance, cost and financial sub-models,
    /// evaluated in that order.
    Split {
        performance: Box<dyn SubModel>,
        cost: Option<Box<dyn SubModel>>,
        financial: Option<Box<dyn SubModel>>,
    },
    /// A node that does not decompose: composite technologies, feedstocks,
    /// transport links and the financial aggregator.
    Single(Box<dyn SubModel>),
}

impl NodeBody {
    fn stages(&self) -> Vec<&dyn SubModel> {
        match self {
            NodeBody::Split {
                performance,
                cost,
                financial,
            } => std::iter::once(performance)
                .chain(cost.iter())
                .chain(financial.iter())
                .map(|m| m.as_ref())
                .collect(),
            NodeBody::Single(model) => vec![model.as_ref()],
        }
    }

    fn stages_mut(&mut self) -> Vec<&mut Box<dyn SubModel>> {
        match self {
            NodeBody::Split {
                performance,
                cost,
                financial,
            } => std::iter::once(performance)
                .chain(cost.iter_mut())
                .chain(financial.iter_mut())
                .collect(),
            NodeBody::Single(model) => vec![model],
        }
    }
}

/// Result of evaluating one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOutputs {
    pub values: BTreeMap<String, Value>,
    /// Cache lookups made by the node's sub-models.
    pub cache: Vec<CacheOutcome>,
}

/// A named plant node and its boundary ports.
///
/// Inputs of a later sub-model that match an output of an earlier one are
/// satisfied inside the node and do not appear at the boundary. Inputs with
/// the same name across sub-models share one boundary input.
pub struct TechnologyNode {
    name: String,
    kind: TechnologyKind,
    model: Option<ModelKind>,
    body: NodeBody,
    inputs: Vec<PortSpec>,
    outputs: Vec<PortSpec>,
}

impl TechnologyNode {
    pub fn new(
        name: impl Into<String>,
        kind: TechnologyKind,
        model: Option<ModelKind>,
        body: NodeBody,
    ) -> AppResult<Self> {
        let name = name.into();
        let mut inputs: Vec<PortSpec> = Vec::new();
        let mut outputs: Vec<PortSpec> = Vec::new();

        for stage in body.stages() {
            let (stage_inputs, stage_outputs) = stage.declare_ports();
            for input in stage_inputs {
                if let Some(internal) = outputs.iter().find(|o| o.name == input.name) {
                    if !internal.unit.convertible_to(input.unit) {
                        return Err(AppError::config(
                            &name,
                            format!(
                                "{} reads '{}' in {} but it is produced in {}",
                                stage.name(),
                                input.name,
                                input.unit,
                                internal.unit
                            ),
                        ));
                    }
                    continue;
                }
                if !inputs.iter().any(|i| i.name == input.name) {
                    inputs.push(input);
                }
            }
            for output in stage_outputs {
                if outputs.iter().any(|o| o.name == output.name) {
                    return Err(GraphError::DuplicatePort {
                        node: name.clone(),
                        port: output.name,
                        direction: PortDirection::Output,
                    }
                    .into());
                }
                outputs.push(output);
            }
        }

        Ok(Self {
            name,
            kind,
            model,
            body,
            inputs,
            outputs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TechnologyKind {
        self.kind
    }

    pub fn model(&self) -> Option<ModelKind> {
        self.model
    }

    pub fn inputs(&self) -> &[PortSpec] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[PortSpec] {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&PortSpec> {
        self.outputs.iter().find(|p| p.name == name)
    }

    pub fn has_cost_outputs(&self) -> bool {
        self.output("CapEx").is_some() && self.output("OpEx").is_some()
    }

    /// Sub-model names, in evaluation order.
    pub fn stage_names(&self) -> Vec<String> {
        self.body
            .stages()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    fn evaluation_error(&self, stage: &str, err: impl ToString) -> AppError {
        AppError::ModelEvaluation {
            node: self.name.clone(),
            message: format!("{}: {}", stage, err.to_string()),
        }
    }

    /// Evaluate every sub-model in order.
    ///
    /// `inputs` holds one value per boundary input, already in the boundary
    /// unit. Sub-models marked cacheable are served through `cache` when one
    /// is given.
    pub fn evaluate(
        &mut self,
        inputs: BTreeMap<String, Value>,
        cache: Option<&CacheStore>,
    ) -> AppResult<NodeOutputs> {
        // Every value visible inside the node, with the unit it is held in.
        let mut available: BTreeMap<String, (Value, Unit)> = BTreeMap::new();
        for spec in &self.inputs {
            let value = inputs.get(&spec.name).cloned().ok_or_else(|| {
                self.evaluation_error(&self.name, format!("no value for input '{}'", spec.name))
            })?;
            available.insert(spec.name.clone(), (value, spec.unit));
        }

        let node_name = self.name.clone();
        let namespace = format!(
            "{}/{}",
            self.model.map_or(self.kind.as_str(), |m| m.as_str()),
            node_name
        );
        let mut produced = BTreeMap::new();
        let mut outcomes = Vec::new();

        for stage in self.body.stages_mut() {
            let stage_name = stage.name().to_string();
            let (declared_inputs, declared_outputs) = stage.declare_ports();
            let err = |e: &dyn std::fmt::Display| AppError::ModelEvaluation {
                node: node_name.clone(),
                message: format!("{}: {}", stage_name, e),
            };

            let mut stage_inputs = PortValues::new();
            for spec in &declared_inputs {
                let (value, unit) = available
                    .get(&spec.name)
                    .ok_or_else(|| err(&format!("no value for input '{}'", spec.name)))?;
                let factor = unit.factor_to(spec.unit).map_err(|e| err(&e))?;
                let value = value.scaled(factor);
                value.check_shape(spec.shape).map_err(|e| err(&e))?;
                stage_inputs.insert(spec.name.clone(), value);
            }

            let cache_spec = stage.cache_spec();
            let mut compute = || {
                stage
                    .evaluate(&stage_inputs)
                    .map(PortValues::into_inner)
                    .map_err(|e: ModelError| err(&e))
            };
            let outputs = match (cache, cache_spec) {
                (Some(store), Some(spec)) => {
                    let key = compute_cache_key(&namespace, &spec.config, &spec.scenario);
                    let (values, outcome) =
                        store.get_or_compute::<AppError, _>(&key, &namespace, &spec.fields, compute)?;
                    debug!(node = %node_name, key = %key, ?outcome, "cache lookup");
                    outcomes.push(outcome);
                    values
                }
                _ => compute()?,
            };

            for spec in &declared_outputs {
                let value = outputs
                    .get(&spec.name)
                    .ok_or_else(|| err(&format!("declared output '{}' was not produced", spec.name)))?;
                value.check_shape(spec.shape).map_err(|e| err(&e))?;
                value
                    .check_finite("output")
                    .map_err(|e| err(&format!("'{}': {}", spec.name, e)))?;
                available.insert(spec.name.clone(), (value.clone(), spec.unit));
                produced.insert(spec.name.clone(), value.clone());
            }
            for extra in outputs.keys().filter(|k| !declared_outputs.iter().any(|d| &d.name == *k)) {
                debug!(node = %node_name, stage = %stage_name, port = %extra, "ignoring undeclared output");
            }
        }

        Ok(NodeOutputs {
            values: produced,
            cache: outcomes,
        })
    }
}
