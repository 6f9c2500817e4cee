//! Purchased feedstock supplies (grid electricity, water, natural gas).

use pf_core::{Dimension, HOURS_PER_YEAR, Shape, Unit};
use pf_graph::PortSpec;

use crate::common::{check_finite, check_non_negative};
use crate::error::{ModelError, ModelResult};
use crate::traits::{PortValues, SubModel};

/// One purchased resource and its constant supply rate.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedstockSupply {
    pub name: String,
    /// Unit of `rate`; must be a power or mass-rate unit.
    pub unit: Unit,
    pub rate: f64,
    /// Price per unit of supplied energy (kWh) or mass (kg).
    pub price_per_unit: f64,
}

/// Feedstock node: a constant hourly supply per resource plus its yearly
/// purchase cost.
///
/// Outputs `{name}` as an hourly series in the supply unit and
/// `{name}_cost` in USD/year.
#[derive(Debug, Clone)]
pub struct FeedstockSource {
    name: String,
    supplies: Vec<FeedstockSupply>,
}

impl FeedstockSource {
    pub const MODEL: &'static str = "feedstock";

    pub fn new(name: impl Into<String>, supplies: Vec<FeedstockSupply>) -> ModelResult<Self> {
        for supply in &supplies {
            match supply.unit.dimension() {
                Dimension::Power | Dimension::MassRate => {}
                other => {
                    return Err(ModelError::invalid_config(
                        Self::MODEL,
                        format!(
                            "feedstock '{}' has unit {} ({:?}); expected a power or mass-rate unit",
                            supply.name, supply.unit, other
                        ),
                    ));
                }
            }
            check_non_negative(Self::MODEL, "rate", supply.rate)?;
            check_finite(Self::MODEL, "price_per_unit", supply.price_per_unit)?;
        }
        Ok(Self {
            name: name.into(),
            supplies,
        })
    }

    /// Yearly amount delivered, in kWh for power supplies or kg for mass rates.
    fn annual_quantity(supply: &FeedstockSupply) -> ModelResult<f64> {
        let per_hour = match supply.unit.dimension() {
            Dimension::Power => supply.rate * supply.unit.factor_to(Unit::Kilowatt)?,
            _ => supply.rate * supply.unit.factor_to(Unit::KilogramPerHour)?,
        };
        Ok(per_hour * HOURS_PER_YEAR as f64)
    }
}

impl SubModel for FeedstockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        let outputs = self
            .supplies
            .iter()
            .flat_map(|s| {
                [
                    PortSpec::new(s.name.clone(), s.unit, Shape::hourly()),
                    PortSpec::scalar(format!("{}_cost", s.name), Unit::UsdPerYear),
                ]
            })
            .collect();
        (vec![], outputs)
    }

    fn evaluate(&mut self, _inputs: &PortValues) -> ModelResult<PortValues> {
        let mut out = PortValues::new();
        for supply in &self.supplies {
            out.insert(supply.name.clone(), vec![supply.rate; HOURS_PER_YEAR]);
            let cost = Self::annual_quantity(supply)? * supply.price_per_unit;
            out.insert(format!("{}_cost", supply.name), cost);
        }
        Ok(out)
    }
}
