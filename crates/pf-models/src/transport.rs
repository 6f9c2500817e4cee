//! Transport links inserted on connections (electrical cables and pipes)
//! and the power combiner joining several feeds into one.

use pf_core::{Shape, Unit, Value};
use pf_graph::PortSpec;
use serde::Deserialize;

use crate::common::check_fraction;
use crate::error::{ModelError, ModelResult};
use crate::traits::{ModelContext, PortValues, SubModel};

/// Parameters of one transport link.
///
/// The engine fills `variable` with the carried quantity; `loss_fraction`
/// comes from plant-level transport settings.
#[derive(Debug, Clone, Deserialize)]
struct TransportDetails {
    variable: String,
    #[serde(default)]
    loss_fraction: f64,
}

/// Pass-through link with an optional proportional loss.
///
/// Ports are `{variable}_input` and `{variable}_output`, both in the link's
/// working unit; the output equals the input times `1 - loss_fraction`.
#[derive(Debug, Clone)]
pub struct TransportLink {
    name: String,
    unit: Unit,
    variable: String,
    loss_fraction: f64,
}

impl TransportLink {
    fn from_details(ctx: &ModelContext, model: &'static str, unit: Unit) -> ModelResult<Self> {
        let details: TransportDetails = ctx.parse_details(model)?;
        if details.variable.trim().is_empty() {
            return Err(ModelError::invalid_config(model, "carried variable is empty"));
        }
        check_fraction(model, "loss_fraction", details.loss_fraction)?;
        if details.loss_fraction >= 1.0 {
            return Err(ModelError::invalid_config(
                model,
                "loss_fraction must be below 1",
            ));
        }
        Ok(Self {
            name: ctx.tech_name.clone(),
            unit,
            variable: details.variable,
            loss_fraction: details.loss_fraction,
        })
    }

    /// Electrical cable carrying a power quantity.
    pub fn cable(ctx: &ModelContext) -> ModelResult<Self> {
        Self::from_details(ctx, "cable", Unit::Kilowatt)
    }

    /// Pipe carrying a mass-rate quantity.
    pub fn pipe(ctx: &ModelContext) -> ModelResult<Self> {
        Self::from_details(ctx, "pipe", Unit::KilogramPerSecond)
    }

    pub fn input_port(&self) -> String {
        format!("{}_input", self.variable)
    }

    pub fn output_port(&self) -> String {
        format!("{}_output", self.variable)
    }
}

impl SubModel for TransportLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![PortSpec::new(self.input_port(), self.unit, Shape::Dynamic)],
            vec![PortSpec::new(self.output_port(), self.unit, Shape::Dynamic)],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let carried = inputs.value(&self.input_port())?;
        let delivered = carried.scaled(1.0 - self.loss_fraction);
        Ok(PortValues::new().with(self.output_port(), delivered))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CombinerDetails {
    #[serde(default = "default_combiner_inputs")]
    inputs: usize,
}

fn default_combiner_inputs() -> usize {
    2
}

/// Sums several power feeds into one.
///
/// Inputs are `electricity_input1` .. `electricity_input{n}`; the output
/// `electricity_output` is their element-wise sum.
#[derive(Debug, Clone)]
pub struct PowerCombiner {
    name: String,
    inputs: usize,
}

impl PowerCombiner {
    pub const MODEL: &'static str = "combiner";

    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        let details: CombinerDetails = ctx.parse_details(Self::MODEL)?;
        if details.inputs < 2 {
            return Err(ModelError::invalid_config(
                Self::MODEL,
                format!("needs at least 2 inputs, got {}", details.inputs),
            ));
        }
        Ok(Self {
            name: ctx.tech_name.clone(),
            inputs: details.inputs,
        })
    }

    fn input_port(i: usize) -> String {
        format!("electricity_input{}", i)
    }
}

impl SubModel for PowerCombiner {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        let inputs = (1..=self.inputs)
            .map(|i| PortSpec::new(Self::input_port(i), Unit::Kilowatt, Shape::Dynamic))
            .collect();
        (
            inputs,
            vec![PortSpec::new("electricity_output", Unit::Kilowatt, Shape::Dynamic)],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let mut total = inputs.value(&Self::input_port(1))?.clone();
        for i in 2..=self.inputs {
            let port = Self::input_port(i);
            total = match (total, inputs.value(&port)?) {
                (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(a + *b),
                (Value::Series(a), Value::Series(b)) if a.len() == b.len() => {
                    Value::Series(a.iter().zip(b).map(|(x, y)| x + y).collect())
                }
                (acc, other) => {
                    return Err(ModelError::evaluation(format!(
                        "cannot add {} of length {:?} to a feed of length {:?}",
                        port,
                        other.len(),
                        acc.len()
                    )));
                }
            };
        }
        Ok(PortValues::new().with("electricity_output", total))
    }
}
