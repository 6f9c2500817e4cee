//! Hybrid wind + solar plant.
//!
//! The hybrid simulation produces generation and cost jointly, so it is a
//! single composite sub-model rather than a performance/cost/financial
//! split. Its result depends only on its configuration and the plant
//! lifetime, which makes it a candidate for the sub-simulation cache.

use std::collections::BTreeMap;

use pf_core::units::mps;
use pf_core::{HOURS_PER_YEAR, Shape, Unit};
use pf_graph::PortSpec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uom::si::area::square_meter;
use uom::si::f64::{Area, MassDensity};
use uom::si::mass_density::kilogram_per_cubic_meter;

use crate::common::{
    check_fraction, check_non_negative, diurnal_wind_speed, rotor_power_kw, solar_availability,
};
use crate::error::{ModelError, ModelResult};
use crate::traits::{CacheSpec, ModelContext, PortValues, SubModel};

fn default_mean_wind_speed() -> f64 {
    7.5
}

fn default_degradation() -> f64 {
    0.005
}

fn default_wind_capex() -> f64 {
    1300.0
}

fn default_solar_capex() -> f64 {
    1000.0
}

fn default_opex_fraction() -> f64 {
    0.025
}

/// Output ports persisted in the cache entry.
pub const CACHED_FIELDS: [&str; 4] = ["electricity", "annual_energy", "CapEx", "OpEx"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct HybridDetails {
    #[serde(default)]
    wind_capacity_kw: f64,
    #[serde(default)]
    solar_capacity_kw: f64,
    #[serde(default = "default_mean_wind_speed")]
    mean_wind_speed: f64,
    /// Annual output degradation, applied as a lifetime average.
    #[serde(default = "default_degradation")]
    annual_degradation: f64,
    #[serde(default = "default_wind_capex")]
    wind_capex_per_kw: f64,
    #[serde(default = "default_solar_capex")]
    solar_capex_per_kw: f64,
    #[serde(default = "default_opex_fraction")]
    fixed_opex_fraction: f64,
    /// Interconnection limit in kW; generation above it is curtailed.
    #[serde(default)]
    interconnect_kw: Option<f64>,
}

/// Composite hybrid plant producing electricity, CapEx and OpEx together.
#[derive(Debug, Clone)]
pub struct HybridPlant {
    name: String,
    details: HybridDetails,
    plant_life: u32,
}

impl HybridPlant {
    pub const MODEL: &'static str = "hybrid_plant";

    pub fn from_context(ctx: &ModelContext) -> ModelResult<Self> {
        let model = Self::MODEL;
        let details: HybridDetails = ctx.parse_details(model)?;
        check_non_negative(model, "wind_capacity_kw", details.wind_capacity_kw)?;
        check_non_negative(model, "solar_capacity_kw", details.solar_capacity_kw)?;
        check_non_negative(model, "mean_wind_speed", details.mean_wind_speed)?;
        check_fraction(model, "annual_degradation", details.annual_degradation)?;
        check_non_negative(model, "wind_capex_per_kw", details.wind_capex_per_kw)?;
        check_non_negative(model, "solar_capex_per_kw", details.solar_capex_per_kw)?;
        check_fraction(model, "fixed_opex_fraction", details.fixed_opex_fraction)?;
        if let Some(limit) = details.interconnect_kw {
            check_non_negative(model, "interconnect_kw", limit)?;
        }
        if details.wind_capacity_kw + details.solar_capacity_kw <= 0.0 {
            return Err(ModelError::invalid_config(
                model,
                "at least one of wind_capacity_kw and solar_capacity_kw must be positive",
            ));
        }
        Ok(Self {
            name: ctx.tech_name.clone(),
            details,
            plant_life: ctx.plant.plant_life,
        })
    }

    /// Mean output multiplier over the plant life under compound degradation.
    fn lifetime_derate(&self) -> f64 {
        let years = self.plant_life.max(1);
        let keep = 1.0 - self.details.annual_degradation;
        (0..years).map(|y| keep.powi(y as i32)).sum::<f64>() / f64::from(years)
    }

    /// Normalized hourly wind output per kW installed.
    fn wind_shape(&self) -> Vec<f64> {
        // Reference turbine: 1 kW rating reached at 12 m/s.
        let rho = MassDensity::new::<kilogram_per_cubic_meter>(1.225);
        let cp = 0.4;
        let rated_speed = mps(12.0);
        let area_m2 = 1.0 / rotor_power_kw(cp, rho, Area::new::<square_meter>(1.0), rated_speed);
        let area = Area::new::<square_meter>(area_m2);
        diurnal_wind_speed(mps(self.details.mean_wind_speed), 0.3)
            .into_iter()
            .map(|v| rotor_power_kw(cp, rho, area, v).min(1.0))
            .collect()
    }
}

impl SubModel for HybridPlant {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        (
            vec![],
            vec![
                PortSpec::new("electricity", Unit::Kilowatt, Shape::hourly()),
                PortSpec::scalar("annual_energy", Unit::KilowattHour),
                PortSpec::scalar("CapEx", Unit::Usd),
                PortSpec::scalar("OpEx", Unit::UsdPerYear),
            ],
        )
    }

    fn evaluate(&mut self, _inputs: &PortValues) -> ModelResult<PortValues> {
        let d = &self.details;
        let derate = self.lifetime_derate();
        let limit = d.interconnect_kw.unwrap_or(f64::INFINITY);

        let wind = self.wind_shape();
        let solar = solar_availability();
        let electricity: Vec<f64> = wind
            .iter()
            .zip(&solar)
            .map(|(w, s)| ((w * d.wind_capacity_kw + s * d.solar_capacity_kw) * derate).min(limit))
            .collect();
        debug_assert_eq!(electricity.len(), HOURS_PER_YEAR);

        let annual_energy: f64 = electricity.iter().sum();
        let capex =
            d.wind_capacity_kw * d.wind_capex_per_kw + d.solar_capacity_kw * d.solar_capex_per_kw;
        debug!(plant = %self.name, annual_energy_kwh = annual_energy, "hybrid simulation finished");

        let wind_only: Vec<f64> = wind.iter().map(|w| w * d.wind_capacity_kw).collect();
        Ok(PortValues::new()
            .with("electricity", electricity)
            .with("annual_energy", annual_energy)
            .with("CapEx", capex)
            .with("OpEx", capex * d.fixed_opex_fraction)
            // Raw diagnostic series; not declared and not cached.
            .with("wind_electricity", wind_only))
    }

    fn cache_spec(&self) -> Option<CacheSpec> {
        let config = match serde_json::to_value(&self.details) {
            Ok(config) => config,
            Err(e) => {
                warn!(plant = %self.name, error = %e, "configuration not serialisable; caching disabled");
                return None;
            }
        };
        let mut scenario = BTreeMap::new();
        scenario.insert("plant_life".to_string(), serde_json::json!(self.plant_life));
        Some(CacheSpec {
            config,
            scenario,
            fields: CACHED_FIELDS.iter().map(|f| f.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PlantParams;

    fn plant(yaml: &str, life: u32) -> HybridPlant {
        HybridPlant::from_context(&ModelContext::new(
            "hybrid",
            serde_yaml::from_str(yaml).unwrap(),
            PlantParams {
                plant_life: life,
                cost_year: 2022,
            },
        ))
        .unwrap()
    }

    #[test]
    fn evaluation_is_deterministic() {
        let mut a = plant("wind_capacity_kw: 1000\nsolar_capacity_kw: 500", 25);
        let mut b = plant("wind_capacity_kw: 1000\nsolar_capacity_kw: 500", 25);
        let ra = a.evaluate(&PortValues::new()).unwrap();
        let rb = b.evaluate(&PortValues::new()).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(ra.series("electricity").unwrap().len(), HOURS_PER_YEAR);
    }

    #[test]
    fn curtailment_respects_interconnect() {
        let mut p = plant(
            "wind_capacity_kw: 1000\nsolar_capacity_kw: 1000\ninterconnect_kw: 800",
            1,
        );
        let out = p.evaluate(&PortValues::new()).unwrap();
        assert!(out.series("electricity").unwrap().iter().all(|e| *e <= 800.0));
    }

    #[test]
    fn cache_spec_tracks_lifetime() {
        let short = plant("wind_capacity_kw: 1000", 10).cache_spec().unwrap();
        let long = plant("wind_capacity_kw: 1000", 30).cache_spec().unwrap();
        assert_eq!(short.config, long.config);
        assert_ne!(short.scenario, long.scenario);
        assert_eq!(short.fields.len(), CACHED_FIELDS.len());
    }

    #[test]
    fn cache_spec_carries_full_configuration() {
        let spec = plant("wind_capacity_kw: 1000\ninterconnect_kw: 800", 25)
            .cache_spec()
            .unwrap();
        assert_eq!(spec.config["wind_capacity_kw"], serde_json::json!(1000.0));
        assert_eq!(spec.config["interconnect_kw"], serde_json::json!(800.0));
        // defaults are part of the key too
        assert!(spec.config.get("mean_wind_speed").is_some());
        assert_eq!(spec.scenario["plant_life"], serde_json::json!(25));
    }

    #[test]
    fn longer_life_degrades_more() {
        let e10 = plant("solar_capacity_kw: 100", 10)
            .evaluate(&PortValues::new())
            .unwrap()
            .scalar("annual_energy")
            .unwrap();
        let e30 = plant("solar_capacity_kw: 100", 30)
            .evaluate(&PortValues::new())
            .unwrap()
            .scalar("annual_energy")
            .unwrap();
        assert!(e30 < e10);
    }

    #[test]
    fn empty_plant_rejected() {
        let err = HybridPlant::from_context(&ModelContext::new(
            "hybrid",
            serde_yaml::Value::Null,
            PlantParams::default(),
        ))
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig { .. }));
    }
}
