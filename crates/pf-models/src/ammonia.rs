//! Ammonia synthesis plant.

use pf_core::{Shape, Unit};
use pf_graph::PortSpec;
use serde::Deserialize;

use crate::common::{annual_total, check_fraction, check_non_negative, check_positive};
use crate::error::ModelResult;
use crate::traits::{ModelContext, PortValues, SubModel};

/// Stoichiometric hydrogen demand: 3 H2 per 2 NH3, in kg H2 per kg NH3.
pub const HYDROGEN_PER_KG_AMMONIA: f64 = 3.0 * 2.016 / (2.0 * 17.031);

fn default_capex_per_kgpy() -> f64 {
    0.9
}

fn default_fixed_opex_fraction() -> f64 {
    0.04
}

#[derive(Debug, Clone, Deserialize)]
struct AmmoniaDetails {
    /// Nameplate production in kg/year.
    plant_capacity_kgpy: f64,
    capacity_factor: f64,
    /// Installed cost per kg/year of nameplate capacity.
    #[serde(default = "default_capex_per_kgpy")]
    capex_per_kgpy: f64,
    #[serde(default = "default_fixed_opex_fraction")]
    fixed_opex_fraction: f64,
    /// Purchased feedstock cost per kg of ammonia (nitrogen, electricity).
    #[serde(default)]
    variable_cost_per_kg: f64,
}

impl AmmoniaDetails {
    fn parse(ctx: &ModelContext) -> ModelResult<Self> {
        let model = AmmoniaPerformance::MODEL;
        let d: Self = ctx.parse_details(model)?;
        check_positive(model, "plant_capacity_kgpy", d.plant_capacity_kgpy)?;
        check_fraction(model, "capacity_factor", d.capacity_factor)?;
        check_non_negative(model, "capex_per_kgpy", d.capex_per_kgpy)?;
        check_non_negative(model, "fixed_opex_fraction", d.fixed_opex_fraction)?;
        check_non_negative(model, "variable_cost_per_kg", d.variable_cost_per_kg)?;
        Ok(d)
    }
}

/// Annual ammonia production, limited by nameplate capacity and by the
/// hydrogen actually delivered.
#[derive(Debug, Clone)]
pub struct AmmoniaPerformance {
    name: String,
    details: AmmoniaDetails,
}

impl AmmoniaPerformance {
    pub const MODEL: &'static str = "ammonia";

    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        Ok(Self {
            name: format!("{}_performance", ctx.tech_name),
            details: AmmoniaDetails::parse(ctx)?,
        })
    }
}

impl SubModel for AmmoniaPerformance {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![
                PortSpec::new("hydrogen", Unit::KilogramPerHour, Shape::Dynamic),
                PortSpec::scalar("plant_capacity_kgpy", Unit::KilogramPerYear)
                    .with_default(self.details.plant_capacity_kgpy),
                PortSpec::scalar("plant_capacity_factor", Unit::Unitless)
                    .with_default(self.details.capacity_factor),
            ],
            vec![
                PortSpec::scalar("ammonia_production_kgpy", Unit::KilogramPerYear),
                PortSpec::scalar("total_ammonia_produced", Unit::Kilogram),
            ],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let nameplate =
            inputs.scalar("plant_capacity_kgpy")? * inputs.scalar("plant_capacity_factor")?;
        let hydrogen_kg = annual_total(inputs.value("hydrogen")?);
        let feed_limited = hydrogen_kg / HYDROGEN_PER_KG_AMMONIA;
        let production = nameplate.min(feed_limited).max(0.0);
        Ok(PortValues::new()
            .with("ammonia_production_kgpy", production)
            .with("total_ammonia_produced", production))
    }
}

/// Ammonia plant capital and operating cost.
#[derive(Debug, Clone)]
pub struct AmmoniaCost {
    name: String,
    details: AmmoniaDetails,
}

impl AmmoniaCost {
    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        Ok(Self {
            name: format!("{}_cost", ctx.tech_name),
            details: AmmoniaDetails::parse(ctx)?,
        })
    }
}

impl SubModel for AmmoniaCost {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![
                PortSpec::scalar("plant_capacity_kgpy", Unit::KilogramPerYear)
                    .with_default(self.details.plant_capacity_kgpy),
                PortSpec::scalar("ammonia_production_kgpy", Unit::KilogramPerYear)
                    .with_default(0.0),
            ],
            vec![
                PortSpec::scalar("CapEx", Unit::Usd),
                PortSpec::scalar("OpEx", Unit::UsdPerYear),
            ],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let d = &self.details;
        let capex = inputs.scalar("plant_capacity_kgpy")? * d.capex_per_kgpy;
        let variable = inputs.scalar("ammonia_production_kgpy")? * d.variable_cost_per_kg;
        Ok(PortValues::new()
            .with("CapEx", capex)
            .with("OpEx", capex * d.fixed_opex_fraction + variable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PlantParams;

    fn ctx() -> ModelContext {
        let details = serde_yaml::from_str(
            "plant_capacity_kgpy: 1000000.0\ncapacity_factor: 0.9\ncapex_per_kgpy: 1.0\nfixed_opex_fraction: 0.1\nvariable_cost_per_kg: 0.05",
        )
        .unwrap();
        ModelContext::new("ammonia", details, PlantParams::default())
    }

    #[test]
    fn production_limited_by_capacity_factor() {
        let mut model = AmmoniaPerformance::from_context(&ctx()).unwrap();
        let inputs = PortValues::new()
            .with("hydrogen", 1.0e6)
            .with("plant_capacity_kgpy", 1.0e6)
            .with("plant_capacity_factor", 0.9);
        let out = model.evaluate(&inputs).unwrap();
        assert!((out.scalar("ammonia_production_kgpy").unwrap() - 9.0e5).abs() < 1e-6);
    }

    #[test]
    fn production_limited_by_hydrogen() {
        let mut model = AmmoniaPerformance::from_context(&ctx()).unwrap();
        let inputs = PortValues::new()
            .with("hydrogen", vec![HYDROGEN_PER_KG_AMMONIA * 100.0; 10])
            .with("plant_capacity_kgpy", 1.0e6)
            .with("plant_capacity_factor", 0.9);
        let out = model.evaluate(&inputs).unwrap();
        assert!((out.scalar("total_ammonia_produced").unwrap() - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn cost_includes_variable_feedstock() {
        let mut model = AmmoniaCost::from_context(&ctx()).unwrap();
        let inputs = PortValues::new()
            .with("plant_capacity_kgpy", 1.0e6)
            .with("ammonia_production_kgpy", 9.0e5);
        let out = model.evaluate(&inputs).unwrap();
        assert_eq!(out.scalar("CapEx").unwrap(), 1.0e6);
        assert!((out.scalar("OpEx").unwrap() - (1.0e5 + 4.5e4)).abs() < 1e-6);
    }
}
