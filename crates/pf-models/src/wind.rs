//! Wind generation models.
//!
//! Both models drive a rotor power curve with a deterministic diurnal wind
//! profile, producing one operating year of hourly electricity in kW.

use pf_core::{Shape, Unit};
use pf_core::units::{Velocity, mps};
use pf_graph::PortSpec;
use serde::Deserialize;
use uom::si::area::square_meter;
use uom::si::f64::{Area, MassDensity};
use uom::si::mass_density::kilogram_per_cubic_meter;
use uom::si::velocity::meter_per_second;

use crate::common::{
    check_fraction, check_non_negative, check_positive, diurnal_wind_speed, rotor_power_kw,
};
use crate::error::ModelResult;
use crate::traits::{ModelContext, PortValues, SubModel};

fn default_mean_wind_speed() -> f64 {
    7.5
}

fn default_swing() -> f64 {
    0.3
}

fn default_cp() -> f64 {
    0.4
}

fn default_air_density() -> f64 {
    1.225
}

/// Rotor and site parameters shared by the wind models.
#[derive(Debug, Clone, Deserialize)]
struct RotorDetails {
    #[serde(default = "default_mean_wind_speed")]
    mean_wind_speed: f64,
    #[serde(default = "default_swing")]
    diurnal_swing: f64,
    #[serde(default = "default_cp")]
    power_coefficient: f64,
    #[serde(default = "default_air_density")]
    air_density: f64,
}

impl RotorDetails {
    fn validate(&self, model: &str) -> ModelResult<()> {
        check_non_negative(model, "mean_wind_speed", self.mean_wind_speed)?;
        check_fraction(model, "diurnal_swing", self.diurnal_swing)?;
        check_fraction(model, "power_coefficient", self.power_coefficient)?;
        check_positive(model, "air_density", self.air_density)?;
        Ok(())
    }

    fn profile(&self) -> Vec<Velocity> {
        diurnal_wind_speed(mps(self.mean_wind_speed), self.diurnal_swing)
    }

    fn density(&self) -> MassDensity {
        MassDensity::new::<kilogram_per_cubic_meter>(self.air_density)
    }
}

// ---------------------------------------------------------------------------
// dummy_wind_turbine
// ---------------------------------------------------------------------------

fn default_swept_area() -> f64 {
    10.0
}

#[derive(Debug, Clone, Deserialize)]
struct DummyTurbineDetails {
    #[serde(flatten)]
    rotor: RotorDetails,
    #[serde(default = "default_swept_area")]
    swept_area_m2: f64,
    #[serde(default)]
    capex_per_m2: f64,
    #[serde(default)]
    opex_per_m2_year: f64,
}

/// A single small turbine with an uncapped power curve.
#[derive(Debug, Clone)]
pub struct DummyTurbinePerformance {
    name: String,
    details: DummyTurbineDetails,
}

impl DummyTurbinePerformance {
    pub const MODEL: &'static str = "dummy_wind_turbine";

    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        let details: DummyTurbineDetails = ctx.parse_details(Self::MODEL)?;
        details.rotor.validate(Self::MODEL)?;
        check_positive(Self::MODEL, "swept_area_m2", details.swept_area_m2)?;
        Ok(Self {
            name: format!("{}_performance", ctx.tech_name),
            details,
        })
    }
}

impl SubModel for DummyTurbinePerformance {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![],
            vec![
                PortSpec::new("electricity", Unit::Kilowatt, Shape::hourly()),
                PortSpec::new("wind_speed", Unit::MeterPerSecond, Shape::hourly()),
            ],
        )
    }

    fn evaluate(&mut self, _inputs: &PortValues) -> ModelResult<PortValues> {
        let rotor = &self.details.rotor;
        let area = Area::new::<square_meter>(self.details.swept_area_m2);
        let speeds = rotor.profile();
        let electricity: Vec<f64> = speeds
            .iter()
            .map(|v| rotor_power_kw(rotor.power_coefficient, rotor.density(), area, *v))
            .collect();
        let wind_speed: Vec<f64> = speeds.iter().map(|v| v.get::<meter_per_second>()).collect();
        Ok(PortValues::new()
            .with("electricity", electricity)
            .with("wind_speed", wind_speed))
    }
}

/// Area-proportional cost of the dummy turbine.
#[derive(Debug, Clone)]
pub struct DummyTurbineCost {
    name: String,
    details: DummyTurbineDetails,
}

impl DummyTurbineCost {
    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        let details: DummyTurbineDetails = ctx.parse_details(DummyTurbinePerformance::MODEL)?;
        check_non_negative(DummyTurbinePerformance::MODEL, "capex_per_m2", details.capex_per_m2)?;
        check_non_negative(
            DummyTurbinePerformance::MODEL,
            "opex_per_m2_year",
            details.opex_per_m2_year,
        )?;
        Ok(Self {
            name: format!("{}_cost", ctx.tech_name),
            details,
        })
    }
}

impl SubModel for DummyTurbineCost {
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
        let area = self.details.swept_area_m2;
        Ok(PortValues::new()
            .with("CapEx", area * self.details.capex_per_m2)
            .with("OpEx", area * self.details.opex_per_m2_year))
    }
}

// ---------------------------------------------------------------------------
// wind_plant
// ---------------------------------------------------------------------------

fn default_num_turbines() -> u32 {
    20
}

fn default_rating() -> f64 {
    3000.0
}

fn default_rotor_diameter() -> f64 {
    120.0
}

fn default_losses() -> f64 {
    10.0
}

fn default_cut_in() -> f64 {
    3.0
}

fn default_cut_out() -> f64 {
    25.0
}

fn default_capex_per_kw() -> f64 {
    1300.0
}

fn default_opex_per_kw_year() -> f64 {
    40.0
}

#[derive(Debug, Clone, Deserialize)]
struct WindPlantDetails {
    #[serde(flatten)]
    rotor: RotorDetails,
    #[serde(default = "default_num_turbines")]
    num_turbines: u32,
    #[serde(default = "default_rating")]
    turbine_rating_kw: f64,
    #[serde(default = "default_rotor_diameter")]
    rotor_diameter: f64,
    /// Percent of gross generation lost to wakes, availability and electrical losses.
    #[serde(default = "default_losses")]
    operational_losses: f64,
    #[serde(default = "default_cut_in")]
    cut_in_speed: f64,
    #[serde(default = "default_cut_out")]
    cut_out_speed: f64,
    #[serde(default = "default_capex_per_kw")]
    capex_per_kw: f64,
    #[serde(default = "default_opex_per_kw_year")]
    opex_per_kw_year: f64,
}

impl WindPlantDetails {
    fn parse(ctx: &ModelContext) -> ModelResult<Self> {
        let model = WindPlantPerformance::MODEL;
        let details: Self = ctx.parse_details(model)?;
        details.rotor.validate(model)?;
        check_positive(model, "turbine_rating_kw", details.turbine_rating_kw)?;
        check_positive(model, "rotor_diameter", details.rotor_diameter)?;
        check_non_negative(model, "capex_per_kw", details.capex_per_kw)?;
        check_non_negative(model, "opex_per_kw_year", details.opex_per_kw_year)?;
        check_fraction(model, "operational_losses / 100", details.operational_losses / 100.0)?;
        if details.cut_out_speed <= details.cut_in_speed {
            return Err(crate::error::ModelError::invalid_config(
                model,
                "cut_out_speed must exceed cut_in_speed",
            ));
        }
        Ok(details)
    }

    fn system_capacity_kw(&self) -> f64 {
        f64::from(self.num_turbines) * self.turbine_rating_kw
    }

    /// Net output of one turbine at wind speed `v`, in kW.
    fn turbine_output_kw(&self, v: Velocity) -> f64 {
        let speed = v.get::<meter_per_second>();
        if speed < self.cut_in_speed || speed >= self.cut_out_speed {
            return 0.0;
        }
        let radius = self.rotor_diameter / 2.0;
        let area = Area::new::<square_meter>(std::f64::consts::PI * radius * radius);
        rotor_power_kw(self.rotor.power_coefficient, self.rotor.density(), area, v)
            .min(self.turbine_rating_kw)
    }
}

/// Utility-scale wind farm of identical turbines.
#[derive(Debug, Clone)]
pub struct WindPlantPerformance {
    name: String,
    details: WindPlantDetails,
}

impl WindPlantPerformance {
    pub const MODEL: &'static str = "wind_plant";

    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        Ok(Self {
            name: format!("{}_performance", ctx.tech_name),
            details: WindPlantDetails::parse(ctx)?,
        })
    }
}

impl SubModel for WindPlantPerformance {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![],
            vec![
                PortSpec::new("electricity", Unit::Kilowatt, Shape::hourly()),
                PortSpec::scalar("system_capacity", Unit::Kilowatt),
            ],
        )
    }

    fn evaluate(&mut self, _inputs: &PortValues) -> ModelResult<PortValues> {
        let d = &self.details;
        let derate = 1.0 - d.operational_losses / 100.0;
        let turbines = f64::from(d.num_turbines);
        let electricity: Vec<f64> = d
            .rotor
            .profile()
            .into_iter()
            .map(|v| d.turbine_output_kw(v) * turbines * derate)
            .collect();
        Ok(PortValues::new()
            .with("electricity", electricity)
            .with("system_capacity", d.system_capacity_kw()))
    }
}

/// Capacity-proportional wind farm cost.
#[derive(Debug, Clone)]
pub struct WindPlantCost {
    name: String,
    details: WindPlantDetails,
}

impl WindPlantCost {
    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        Ok(Self {
            name: format!("{}_cost", ctx.tech_name),
            details: WindPlantDetails::parse(ctx)?,
        })
    }
}

impl SubModel for WindPlantCost {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        // system_capacity is promoted from the performance model when present.
        (
            vec![
                PortSpec::scalar("system_capacity", Unit::Kilowatt)
                    .with_default(self.details.system_capacity_kw()),
            ],
            vec![
                PortSpec::scalar("CapEx", Unit::Usd),
                PortSpec::scalar("OpEx", Unit::UsdPerYear),
            ],
        )
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let capacity = inputs.scalar("system_capacity")?;
        Ok(PortValues::new()
            .with("CapEx", capacity * self.details.capex_per_kw)
            .with("OpEx", capacity * self.details.opex_per_kw_year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PlantParams;
    use pf_core::HOURS_PER_YEAR;

    fn ctx(yaml: &str) -> ModelContext {
        ModelContext::new("wind", serde_yaml::from_str(yaml).unwrap(), PlantParams::default())
    }

    #[test]
    fn dummy_turbine_follows_cube_law() {
        let mut model =
            DummyTurbinePerformance::from_context(&ctx("mean_wind_speed: 10.0\ndiurnal_swing: 0.0"))
                .unwrap();
        let out = model.evaluate(&PortValues::new()).unwrap();
        let electricity = out.series("electricity").unwrap();
        assert_eq!(electricity.len(), HOURS_PER_YEAR);
        // 0.5 * 0.4 * 1.225 * 10 m^2 * (10 m/s)^3 = 2450 W
        assert!((electricity[0] - 2.45).abs() < 1e-9);
        assert!(electricity.iter().all(|p| (p - 2.45).abs() < 1e-9));
    }

    #[test]
    fn wind_plant_is_capped_at_rating() {
        let mut model = WindPlantPerformance::from_context(&ctx(
            "mean_wind_speed: 14.0\nnum_turbines: 2\nturbine_rating_kw: 1000.0\noperational_losses: 0.0",
        ))
        .unwrap();
        let out = model.evaluate(&PortValues::new()).unwrap();
        let electricity = out.series("electricity").unwrap();
        assert!(electricity.iter().all(|p| *p <= 2000.0 + 1e-9));
        assert!(electricity.iter().any(|p| (*p - 2000.0).abs() < 1e-9));
        assert_eq!(out.scalar("system_capacity").unwrap(), 2000.0);
    }

    #[test]
    fn wind_plant_cost_scales_with_capacity() {
        let mut cost = WindPlantCost::from_context(&ctx(
            "num_turbines: 10\nturbine_rating_kw: 2000.0\ncapex_per_kw: 1000.0\nopex_per_kw_year: 30.0",
        ))
        .unwrap();
        let (inputs, _) = cost.declare_ports();
        assert_eq!(inputs[0].default, Some(20_000.0));
        let out = cost
            .evaluate(&PortValues::new().with("system_capacity", 20_000.0))
            .unwrap();
        assert_eq!(out.scalar("CapEx").unwrap(), 20_000_000.0);
        assert_eq!(out.scalar("OpEx").unwrap(), 600_000.0);
    }

    #[test]
    fn invalid_cut_speeds_rejected() {
        let err = WindPlantPerformance::from_context(&ctx("cut_in_speed: 10.0\ncut_out_speed: 5.0"))
            .unwrap_err();
        assert!(err.to_string().contains("cut_out_speed"));
    }
}
