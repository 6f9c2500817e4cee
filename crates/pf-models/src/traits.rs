//! Core traits and payload types for technology sub-models.

use std::collections::BTreeMap;

use pf_core::Value;
use pf_graph::PortSpec;
use serde::de::DeserializeOwned;

use crate::error::{ModelError, ModelResult};

/// Named port values passed into and out of a sub-model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortValues {
    values: BTreeMap<String, Value>,
}

impl PortValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, port: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(port.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, port: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(port, value);
        self
    }

    pub fn get(&self, port: &str) -> Option<&Value> {
        self.values.get(port)
    }

    pub fn contains(&self, port: &str) -> bool {
        self.values.contains_key(port)
    }

    /// Required value of any shape.
    pub fn value(&self, port: &str) -> ModelResult<&Value> {
        self.values.get(port).ok_or_else(|| ModelError::MissingInput {
            port: port.to_string(),
        })
    }

    /// Required scalar input.
    pub fn scalar(&self, port: &str) -> ModelResult<f64> {
        self.value(port)?
            .as_scalar()
            .ok_or_else(|| ModelError::InputShape {
                port: port.to_string(),
                expected: "scalar",
            })
    }

    /// Required series input.
    pub fn series(&self, port: &str) -> ModelResult<&[f64]> {
        self.value(port)?
            .as_series()
            .ok_or_else(|| ModelError::InputShape {
                port: port.to_string(),
                expected: "series",
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> + '_ {
        self.values.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl From<BTreeMap<String, Value>> for PortValues {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, Value)> for PortValues {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Plant-wide parameters every sub-model may read at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantParams {
    /// Operating lifetime in years.
    pub plant_life: u32,
    /// Common cost-basis year of the plant.
    pub cost_year: i32,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            plant_life: 30,
            cost_year: 2022,
        }
    }
}

/// Everything a constructor needs to build one sub-model.
#[derive(Debug, Clone)]
pub struct ModelContext {
    /// Technology (or transport) node the sub-model belongs to.
    pub tech_name: String,
    /// Opaque per-technology `details` block from configuration.
    pub details: serde_yaml::Value,
    pub plant: PlantParams,
}

impl ModelContext {
    pub fn new(tech_name: impl Into<String>, details: serde_yaml::Value, plant: PlantParams) -> Self {
        Self {
            tech_name: tech_name.into(),
            details,
            plant,
        }
    }

    /// Parse the `details` block into a model's typed configuration.
    ///
    /// A missing block parses as an empty mapping so that models whose
    /// fields all carry defaults need no configuration.
    pub fn parse_details<T: DeserializeOwned>(&self, model: &str) -> ModelResult<T> {
        let details = match &self.details {
            serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
            other => other.clone(),
        };
        serde_yaml::from_value(details)
            .map_err(|e| ModelError::invalid_config(model, format!("{}: {}", self.tech_name, e)))
    }
}

/// Cache declaration of an expensive, configuration-deterministic sub-model.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSpec {
    /// Canonical configuration that fully determines the result.
    pub config: serde_json::Value,
    /// Scalar scenario parameters that also affect the result.
    pub scenario: BTreeMap<String, serde_json::Value>,
    /// Output fields kept in the cache entry.
    pub fields: Vec<String>,
}

/// A performance, cost, financial, transport or composite sub-model.
///
/// Sub-models declare their ports once and are then evaluated at most once
/// per plant run, in schedule order.
pub trait SubModel: Send + Sync {
    /// Sub-model name for logging and error attribution.
    fn name(&self) -> &str;

    /// Input and output ports, in that order.
    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>);

    /// Compute outputs from inputs. Inputs arrive already converted to the
    /// declared units.
    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues>;

    /// Cache declaration, for sub-models worth memoizing across runs.
    fn cache_spec(&self) -> Option<CacheSpec> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn typed_accessors() {
        let values = PortValues::new()
            .with("capacity", 5.0)
            .with("electricity", vec![1.0, 2.0]);
        assert_eq!(values.scalar("capacity").unwrap(), 5.0);
        assert_eq!(values.series("electricity").unwrap(), &[1.0, 2.0]);
        assert!(matches!(
            values.scalar("electricity"),
            Err(ModelError::InputShape { .. })
        ));
        assert!(matches!(
            values.scalar("hydrogen"),
            Err(ModelError::MissingInput { .. })
        ));
    }

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default = "default_size")]
        size: f64,
    }

    fn default_size() -> f64 {
        3.0
    }

    #[test]
    fn null_details_use_defaults() {
        let ctx = ModelContext::new("tank", serde_yaml::Value::Null, PlantParams::default());
        let parsed: Sample = ctx.parse_details("sample").unwrap();
        assert_eq!(parsed.size, 3.0);
    }

    #[test]
    fn bad_details_name_the_technology() {
        let details: serde_yaml::Value = serde_yaml::from_str("size: lots").unwrap();
        let ctx = ModelContext::new("tank", details, PlantParams::default());
        let err = ctx.parse_details::<Sample>("sample").unwrap_err();
        assert!(err.to_string().contains("tank"));
    }
}
