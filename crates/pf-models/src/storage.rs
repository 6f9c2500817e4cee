//! Hydrogen storage tank.

use pf_core::{Shape, Unit, Value};
use pf_graph::PortSpec;
use serde::Deserialize;

use crate::common::{check_non_negative, check_positive};
use crate::error::{ModelError, ModelResult};
use crate::traits::{ModelContext, PortValues, SubModel};

fn default_capex_per_kg() -> f64 {
    500.0
}

fn default_opex_fraction() -> f64 {
    0.02
}

#[derive(Debug, Clone, Deserialize)]
struct TankDetails {
    /// Usable capacity in kg.
    total_capacity: f64,
    #[serde(default = "default_capex_per_kg")]
    capex_per_kg: f64,
    #[serde(default = "default_opex_fraction")]
    fixed_opex_fraction: f64,
}

impl TankDetails {
    fn parse(ctx: &ModelContext) -> ModelResult<Self> {
        let model = TankPerformance::MODEL;
        let d: Self = ctx.parse_details(model)?;
        check_positive(model, "total_capacity", d.total_capacity)?;
        check_non_negative(model, "capex_per_kg", d.capex_per_kg)?;
        check_non_negative(model, "fixed_opex_fraction", d.fixed_opex_fraction)?;
        Ok(d)
    }
}

/// Hourly state of charge of a bounded hydrogen tank.
///
/// Inflow above the remaining headroom is spilled and outflow beyond the
/// stored mass is curtailed, so `stored_hydrogen` stays in
/// `[0, total_capacity]`.
#[derive(Debug, Clone)]
pub struct TankPerformance {
    name: String,
    details: TankDetails,
}

impl TankPerformance {
    pub const MODEL: &'static str = "hydrogen_tank";

    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        Ok(Self {
            name: format!("{}_performance", ctx.tech_name),
            details: TankDetails::parse(ctx)?,
        })
    }
}

impl SubModel for TankPerformance {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![
                PortSpec::new("hydrogen", Unit::KilogramPerHour, Shape::Dynamic),
                PortSpec::new("hydrogen_out", Unit::KilogramPerHour, Shape::Dynamic)
                    .with_default(0.0),
                PortSpec::scalar("initial_hydrogen", Unit::Kilogram).with_default(0.0),
                PortSpec::scalar("total_capacity", Unit::Kilogram)
                    .with_default(self.details.total_capacity),
            ],
            vec![PortSpec::new("stored_hydrogen", Unit::Kilogram, Shape::Dynamic)],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let capacity = inputs.scalar("total_capacity")?;
        let initial = inputs.scalar("initial_hydrogen")?;
        if initial > capacity {
            return Err(ModelError::evaluation(format!(
                "initial_hydrogen {initial} kg exceeds capacity {capacity} kg"
            )));
        }

        let inflow = inputs.value("hydrogen")?;
        let outflow = inputs.value("hydrogen_out")?;
        let steps = inflow.len().or(outflow.len()).unwrap_or(1);
        let at = |v: &Value, i: usize| match v {
            Value::Scalar(x) => *x,
            Value::Series(xs) => xs.get(i).copied().unwrap_or(0.0),
        };
        if let (Some(a), Some(b)) = (inflow.len(), outflow.len()) {
            if a != b {
                return Err(ModelError::evaluation(format!(
                    "hydrogen has {a} steps but hydrogen_out has {b}"
                )));
            }
        }

        let mut level = initial;
        let stored: Vec<f64> = (0..steps)
            .map(|i| {
                level = (level + at(inflow, i) - at(outflow, i)).clamp(0.0, capacity);
                level
            })
            .collect();

        let stored = match inflow {
            Value::Scalar(_) if outflow.len().is_none() => Value::Scalar(stored[0]),
            _ => Value::Series(stored),
        };
        Ok(PortValues::new().with("stored_hydrogen", stored))
    }
}

/// Capacity-proportional tank cost.
#[derive(Debug, Clone)]
pub struct TankCost {
    name: String,
    details: TankDetails,
}

impl TankCost {
    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        Ok(Self {
            name: format!("{}_cost", ctx.tech_name),
            details: TankDetails::parse(ctx)?,
        })
    }
}

impl SubModel for TankCost {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![
                PortSpec::scalar("total_capacity", Unit::Kilogram)
                    .with_default(self.details.total_capacity),
            ],
            vec![
                PortSpec::scalar("CapEx", Unit::Usd),
                PortSpec::scalar("OpEx", Unit::UsdPerYear),
            ],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let capex = inputs.scalar("total_capacity")? * self.details.capex_per_kg;
        Ok(PortValues::new()
            .with("CapEx", capex)
            .with("OpEx", capex * self.details.fixed_opex_fraction))
    }
}
