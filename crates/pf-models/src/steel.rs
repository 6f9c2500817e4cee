//! Hydrogen direct-reduction steel plant.

use pf_core::{Shape, Unit};
use pf_graph::PortSpec;
use serde::Deserialize;

use crate::common::{check_fraction, check_non_negative, check_positive};
use crate::error::{ModelError, ModelResult};
use crate::traits::{ModelContext, PortValues, SubModel};

/// Hydrogen consumed per tonne of steel, in kg.
pub const HYDROGEN_KG_PER_TONNE_STEEL: f64 = 54.0;

fn default_capex_per_tpy() -> f64 {
    800.0
}

fn default_fixed_opex_fraction() -> f64 {
    0.05
}

#[derive(Debug, Clone, Deserialize)]
struct SteelDetails {
    /// Nameplate production in metric tonnes per year.
    plant_capacity_mtpy: f64,
    capacity_factor: f64,
    /// Levelized cost of purchased hydrogen, USD/kg.
    #[serde(default)]
    lcoh: f64,
    #[serde(default = "default_capex_per_tpy")]
    capex_per_tpy: f64,
    #[serde(default = "default_fixed_opex_fraction")]
    fixed_opex_fraction: f64,
}

impl SteelDetails {
    fn parse(ctx: &ModelContext) -> ModelResult<Self> {
        let model = SteelPerformance::MODEL;
        let d: Self = ctx.parse_details(model)?;
        check_positive(model, "plant_capacity_mtpy", d.plant_capacity_mtpy)?;
        check_fraction(model, "capacity_factor", d.capacity_factor)?;
        check_non_negative(model, "lcoh", d.lcoh)?;
        check_non_negative(model, "capex_per_tpy", d.capex_per_tpy)?;
        check_non_negative(model, "fixed_opex_fraction", d.fixed_opex_fraction)?;
        Ok(d)
    }

    fn annual_tonnes(&self) -> f64 {
        self.plant_capacity_mtpy * self.capacity_factor
    }
}

/// Steel output spread evenly over the electricity profile's time steps.
#[derive(Debug, Clone)]
pub struct SteelPerformance {
    name: String,
    details: SteelDetails,
}

impl SteelPerformance {
    pub const MODEL: &'static str = "steel";

    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        Ok(Self {
            name: format!("{}_performance", ctx.tech_name),
            details: SteelDetails::parse(ctx)?,
        })
    }
}

impl SubModel for SteelPerformance {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![
                PortSpec::new("electricity", Unit::Kilowatt, Shape::Dynamic),
                PortSpec::new("hydrogen", Unit::KilogramPerHour, Shape::Dynamic),
            ],
            vec![
                PortSpec::new("steel", Unit::TonnePerYear, Shape::Dynamic),
                PortSpec::scalar("total_steel_produced", Unit::Kilogram),
            ],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let electricity = inputs.value("electricity")?;
        // Hydrogen must be present even though nameplate output drives production.
        inputs.value("hydrogen")?;
        let annual = self.details.annual_tonnes();
        let steel = match electricity.len() {
            Some(0) => {
                return Err(ModelError::evaluation("electricity profile is empty"));
            }
            Some(n) => electricity.map(|_| annual / n as f64),
            None => electricity.map(|_| annual),
        };
        Ok(PortValues::new()
            .with("steel", steel)
            .with("total_steel_produced", annual * 1000.0))
    }
}

/// Steel plant capital cost and hydrogen-inclusive operating cost.
#[derive(Debug, Clone)]
pub struct SteelCost {
    name: String,
    details: SteelDetails,
}

impl SteelCost {
    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        Ok(Self {
            name: format!("{}_cost", ctx.tech_name),
            details: SteelDetails::parse(ctx)?,
        })
    }
}

impl SubModel for SteelCost {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![
                PortSpec::scalar("plant_capacity_mtpy", Unit::TonnePerYear)
                    .with_default(self.details.plant_capacity_mtpy),
                PortSpec::scalar("plant_capacity_factor", Unit::Unitless)
                    .with_default(self.details.capacity_factor),
                PortSpec::scalar("LCOH", Unit::UsdPerKilogram).with_default(self.details.lcoh),
            ],
            vec![
                PortSpec::scalar("CapEx", Unit::Usd),
                PortSpec::scalar("OpEx", Unit::UsdPerYear),
            ],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let capacity = inputs.scalar("plant_capacity_mtpy")?;
        let tonnes = capacity * inputs.scalar("plant_capacity_factor")?;
        let capex = capacity * self.details.capex_per_tpy;
        let hydrogen_cost = tonnes * HYDROGEN_KG_PER_TONNE_STEEL * inputs.scalar("LCOH")?;
        Ok(PortValues::new()
            .with("CapEx", capex)
            .with("OpEx", capex * self.details.fixed_opex_fraction + hydrogen_cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PlantParams;

    fn ctx() -> ModelContext {
        let details = serde_yaml::from_str(
            "plant_capacity_mtpy: 1000.0\ncapacity_factor: 0.5\nlcoh: 2.0\ncapex_per_tpy: 100.0\nfixed_opex_fraction: 0.1",
        )
        .unwrap();
        ModelContext::new("steel", details, PlantParams::default())
    }

    #[test]
    fn output_spread_over_steps() {
        let mut model = SteelPerformance::from_context(&ctx()).unwrap();
        let inputs = PortValues::new()
            .with("electricity", vec![1.0; 4])
            .with("hydrogen", vec![1.0; 4]);
        let out = model.evaluate(&inputs).unwrap();
        assert_eq!(out.series("steel").unwrap(), &[125.0; 4]);
        assert_eq!(out.scalar("total_steel_produced").unwrap(), 500_000.0);
    }

    #[test]
    fn hydrogen_cost_enters_opex() {
        let mut model = SteelCost::from_context(&ctx()).unwrap();
        let inputs = PortValues::new()
            .with("plant_capacity_mtpy", 1000.0)
            .with("plant_capacity_factor", 0.5)
            .with("LCOH", 2.0);
        let out = model.evaluate(&inputs).unwrap();
        assert_eq!(out.scalar("CapEx").unwrap(), 100_000.0);
        // 10 000 fixed + 500 t * 54 kg/t * 2 USD/kg
        assert_eq!(out.scalar("OpEx").unwrap(), 10_000.0 + 54_000.0);
    }
}
