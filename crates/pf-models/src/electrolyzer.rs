//! Electrolyzer models: a PEM stack with performance, cost and financial
//! sub-models, and a fixed-ratio dummy electrolyzer.

use pf_core::{Shape, Unit, Value};
use pf_graph::PortSpec;
use serde::Deserialize;
use tracing::debug;

use crate::common::{
    annual_total, capital_recovery_factor, check_fraction, check_non_negative, check_positive,
};
use crate::error::{ModelError, ModelResult};
use crate::traits::{ModelContext, PortValues, SubModel};

// ---------------------------------------------------------------------------
// pem_electrolyzer
// ---------------------------------------------------------------------------

fn default_specific_energy() -> f64 {
    55.0
}

fn default_min_load() -> f64 {
    0.1
}

fn default_electrolyzer_cost() -> f64 {
    700.0
}

fn default_opex_fraction() -> f64 {
    0.03
}

fn default_discount_rate() -> f64 {
    0.07
}

#[derive(Debug, Clone, Deserialize)]
struct PemDetails {
    cluster_size_mw: f64,
    /// Electricity needed per kilogram of hydrogen, in kWh/kg.
    #[serde(default = "default_specific_energy")]
    specific_energy_kwh_per_kg: f64,
    /// Fraction of rated power below which the stack idles.
    #[serde(default = "default_min_load")]
    min_load_fraction: f64,
    /// Installed cost in USD/kW (equivalently MUSD/GW).
    #[serde(default = "default_electrolyzer_cost")]
    electrolyzer_cost: f64,
    /// Fixed operating cost as a fraction of CapEx per year.
    #[serde(default = "default_opex_fraction")]
    fixed_opex_fraction: f64,
    #[serde(default = "default_discount_rate")]
    discount_rate: f64,
}

impl PemDetails {
    fn parse(ctx: &ModelContext) -> ModelResult<Self> {
        let model = PemPerformance::MODEL;
        let d: Self = ctx.parse_details(model)?;
        check_positive(model, "cluster_size_mw", d.cluster_size_mw)?;
        check_positive(model, "specific_energy_kwh_per_kg", d.specific_energy_kwh_per_kg)?;
        check_fraction(model, "min_load_fraction", d.min_load_fraction)?;
        check_non_negative(model, "electrolyzer_cost", d.electrolyzer_cost)?;
        check_fraction(model, "fixed_opex_fraction", d.fixed_opex_fraction)?;
        check_fraction(model, "discount_rate", d.discount_rate)?;
        Ok(d)
    }
}

/// Hourly hydrogen production from an electricity profile.
#[derive(Debug, Clone)]
pub struct PemPerformance {
    name: String,
    details: PemDetails,
}

impl PemPerformance {
    pub const MODEL: &'static str = "pem_electrolyzer";

    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        Ok(Self {
            name: format!("{}_performance", ctx.tech_name),
            details: PemDetails::parse(ctx)?,
        })
    }
}

impl SubModel for PemPerformance {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![
                PortSpec::new("electricity", Unit::Kilowatt, Shape::Dynamic),
                PortSpec::scalar("cluster_size", Unit::Megawatt)
                    .with_default(self.details.cluster_size_mw),
            ],
            vec![
                PortSpec::new("hydrogen", Unit::KilogramPerHour, Shape::Dynamic),
                PortSpec::scalar("total_hydrogen_produced", Unit::Kilogram),
            ],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let electricity = inputs.value("electricity")?;
        let rated_kw = inputs.scalar("cluster_size")? * 1000.0;
        if rated_kw.is_nan() || rated_kw <= 0.0 {
            return Err(ModelError::evaluation(format!(
                "cluster_size must be positive, got {} kW",
                rated_kw
            )));
        }
        let min_kw = rated_kw * self.details.min_load_fraction;
        let specific = self.details.specific_energy_kwh_per_kg;

        let hydrogen = electricity.map(|p| {
            let p = p.min(rated_kw);
            if p < min_kw { 0.0 } else { p / specific }
        });
        let total = annual_total(&hydrogen);
        debug!(model = %self.name, total_kg = total, "electrolyzer produced hydrogen");

        Ok(PortValues::new()
            .with("hydrogen", hydrogen)
            .with("total_hydrogen_produced", total))
    }
}

/// Capacity-proportional stack cost.
#[derive(Debug, Clone)]
pub struct PemCost {
    name: String,
    details: PemDetails,
}

impl PemCost {
    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        Ok(Self {
            name: format!("{}_cost", ctx.tech_name),
            details: PemDetails::parse(ctx)?,
        })
    }
}

impl SubModel for PemCost {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![
                PortSpec::scalar("cluster_size", Unit::Megawatt)
                    .with_default(self.details.cluster_size_mw),
            ],
            vec![
                PortSpec::scalar("CapEx", Unit::Usd),
                PortSpec::scalar("OpEx", Unit::UsdPerYear),
            ],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let rated_kw = inputs.scalar("cluster_size")? * 1000.0;
        let capex = rated_kw * self.details.electrolyzer_cost;
        Ok(PortValues::new()
            .with("CapEx", capex)
            .with("OpEx", capex * self.details.fixed_opex_fraction))
    }
}

/// Technology-level levelized cost of hydrogen from annualized CapEx and OpEx.
#[derive(Debug, Clone)]
pub struct PemFinancial {
    name: String,
    discount_rate: f64,
    plant_life: u32,
}

impl PemFinancial {
    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        let details = PemDetails::parse(ctx)?;
        Ok(Self {
            name: format!("{}_financial", ctx.tech_name),
            discount_rate: details.discount_rate,
            plant_life: ctx.plant.plant_life,
        })
    }
}

impl SubModel for PemFinancial {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![
                PortSpec::scalar("CapEx", Unit::Usd),
                PortSpec::scalar("OpEx", Unit::UsdPerYear),
                PortSpec::scalar("total_hydrogen_produced", Unit::Kilogram),
            ],
            vec![PortSpec::scalar("LCOH", Unit::UsdPerKilogram)],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let capex = inputs.scalar("CapEx")?;
        let opex = inputs.scalar("OpEx")?;
        let produced = inputs.scalar("total_hydrogen_produced")?;
        if produced <= 0.0 {
            return Err(ModelError::evaluation(
                "cannot levelize cost: no hydrogen produced",
            ));
        }
        let annualized = capex * capital_recovery_factor(self.discount_rate, self.plant_life) + opex;
        Ok(PortValues::new().with("LCOH", annualized / produced))
    }
}

// ---------------------------------------------------------------------------
// dummy_electrolyzer
// ---------------------------------------------------------------------------

/// Hydrogen produced per kW of electricity, in kg/s.
const DUMMY_HYDROGEN_RATIO: f64 = 0.1;
/// Oxygen produced per kW of electricity, in kg/s.
const DUMMY_OXYGEN_RATIO: f64 = 0.8;

fn default_dummy_rating() -> f64 {
    1000.0
}

fn default_dummy_capex_per_kw() -> f64 {
    1000.0
}

fn default_dummy_opex_per_kw_year() -> f64 {
    30.0
}

#[derive(Debug, Clone, Deserialize)]
struct DummyDetails {
    #[serde(default = "default_dummy_rating")]
    rating_kw: f64,
    #[serde(default = "default_dummy_capex_per_kw")]
    capex_per_kw: f64,
    #[serde(default = "default_dummy_opex_per_kw_year")]
    opex_per_kw_year: f64,
}

/// Fixed-ratio electrolyzer used for wiring tests.
#[derive(Debug, Clone)]
pub struct DummyElectrolyzerPerformance {
    name: String,
}

impl DummyElectrolyzerPerformance {
    pub const MODEL: &'static str = "dummy_electrolyzer";

    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        Ok(Self {
            name: format!("{}_performance", ctx.tech_name),
        })
    }
}

impl SubModel for DummyElectrolyzerPerformance {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![
                PortSpec::new("electricity", Unit::Kilowatt, Shape::Dynamic),
                PortSpec::new("water", Unit::KilogramPerSecond, Shape::Dynamic).with_default(0.0),
            ],
            vec![
                PortSpec::new("hydrogen", Unit::KilogramPerSecond, Shape::Dynamic),
                PortSpec::new("oxygen", Unit::KilogramPerSecond, Shape::Dynamic),
                PortSpec::scalar("total_hydrogen_produced", Unit::Kilogram),
            ],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let electricity = inputs.value("electricity")?;
        let hydrogen: Value = electricity.map(|p| DUMMY_HYDROGEN_RATIO * p);
        let oxygen: Value = electricity.map(|p| DUMMY_OXYGEN_RATIO * p);
        // kg/s held for one hour per step.
        let total = annual_total(&hydrogen) * 3600.0;
        Ok(PortValues::new()
            .with("hydrogen", hydrogen)
            .with("oxygen", oxygen)
            .with("total_hydrogen_produced", total))
    }
}

#[derive(Debug, Clone)]
pub struct DummyElectrolyzerCost {
    name: String,
    details: DummyDetails,
}

impl DummyElectrolyzerCost {
    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        let details: DummyDetails = ctx.parse_details(DummyElectrolyzerPerformance::MODEL)?;
        check_non_negative(DummyElectrolyzerPerformance::MODEL, "rating_kw", details.rating_kw)?;
        Ok(Self {
            name: format!("{}_cost", ctx.tech_name),
            details,
        })
    }
}

impl SubModel for DummyElectrolyzerCost {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![],
            vec![
                PortSpec::scalar("CapEx", Unit::Usd),
                PortSpec::scalar("OpEx", Unit::UsdPerYear),
            ],
        )
    }

    fn evaluate(&mut self, _inputs: &PortValues) -> ModelResult<PortValues> {
        let d = &self.details;
        Ok(PortValues::new()
            .with("CapEx", d.rating_kw * d.capex_per_kw)
            .with("OpEx", d.rating_kw * d.opex_per_kw_year))
    }
}
