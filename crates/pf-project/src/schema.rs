//! Project schema definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_version() -> u32 {
    crate::LATEST_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Technologies in configuration order; this order breaks scheduling ties.
    #[serde(default)]
    pub technologies: Vec<TechnologyDef>,
    pub plant: PlantDef,
}

impl Project {
    pub fn technology(&self, name: &str) -> Option<&TechnologyDef> {
        self.technologies.iter().find(|t| t.name == name)
    }
}

/// One technology entry: either a modelled technology or a feedstock source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnologyDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_model: Option<ModelRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_model: Option<ModelRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_model: Option<ModelRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feedstocks: Vec<FeedstockDef>,
    /// Model-specific parameters, parsed by the resolved model.
    #[serde(default, skip_serializing_if = "serde_yaml::Value::is_null")]
    pub details: serde_yaml::Value,
}

impl TechnologyDef {
    pub fn is_feedstock(&self) -> bool {
        self.performance_model.is_none() && !self.feedstocks.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelRef {
    pub model: String,
}

impl ModelRef {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedstockDef {
    pub name: String,
    /// Unit symbol of `rate`, e.g. `kW` or `kg/h`.
    pub units: String,
    pub rate: f64,
    /// Price per kWh (power feedstocks) or per kg (mass feedstocks).
    #[serde(default)]
    pub price_per_unit: f64,
}

fn default_cost_year() -> i32 {
    2022
}

fn default_plant_life() -> u32 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantDef {
    #[serde(default = "default_cost_year")]
    pub cost_year: i32,
    /// Operating lifetime in years.
    #[serde(default = "default_plant_life")]
    pub plant_life: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<SiteDef>,
    /// Entries of the form `[source, dest, variable]` or
    /// `[source, dest, variable, transport_kind]`.
    #[serde(default)]
    pub technology_interconnections: Vec<Vec<String>>,
    /// Settings per transport kind.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub transport: BTreeMap<String, TransportDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finance_parameters: Option<FinanceParameters>,
}

impl Default for PlantDef {
    fn default() -> Self {
        Self {
            cost_year: default_cost_year(),
            plant_life: default_plant_life(),
            site: None,
            technology_interconnections: Vec::new(),
            transport: BTreeMap::new(),
            finance_parameters: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteDef {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation_m: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransportDef {
    #[serde(default)]
    pub loss_fraction: f64,
}

fn default_discount_rate() -> f64 {
    0.0824
}

fn default_tax_rate() -> f64 {
    0.257
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinanceParameters {
    /// General inflation rate used to move costs between cost-basis years.
    #[serde(default)]
    pub costing_general_inflation: f64,
    /// Cost-basis year per technology; unlisted technologies use the plant
    /// cost year.
    #[serde(default)]
    pub discount_years: BTreeMap<String, i32>,
    #[serde(default = "default_discount_rate")]
    pub discount_rate: f64,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    #[serde(default)]
    pub depreciation: DepreciationDef,
    #[serde(default)]
    pub fixed_cost_escalation: f64,
    /// Commodity whose levelized cost is solved, e.g. `hydrogen`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commodity: Option<String>,
}

impl Default for FinanceParameters {
    fn default() -> Self {
        Self {
            costing_general_inflation: 0.0,
            discount_years: BTreeMap::new(),
            discount_rate: default_discount_rate(),
            tax_rate: default_tax_rate(),
            depreciation: DepreciationDef::default(),
            fixed_cost_escalation: 0.0,
            commodity: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepreciationDef {
    /// `straight_line` or `macrs`.
    pub method: String,
    pub period: u32,
}

impl Default for DepreciationDef {
    fn default() -> Self {
        Self {
            method: "macrs".to_string(),
            period: 7,
        }
    }
}

impl DepreciationDef {
    /// Canonical method name, accepting any case and the `straight-line`
    /// and `sl` spellings.
    pub fn canonical_method(&self) -> Option<&'static str> {
        match self.method.trim().to_ascii_lowercase().as_str() {
            "straight_line" | "straight-line" | "sl" => Some("straight_line"),
            "macrs" => Some("macrs"),
            _ => None,
        }
    }
}
