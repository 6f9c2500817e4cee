//! pf-models: technology sub-model library for plantflow.
//!
//! Provides:
//! - The `SubModel` trait and its port payloads
//! - Wind, electrolyzer, storage, ammonia and steel models split into
//!   performance, cost and financial sub-models
//! - A composite hybrid wind + solar plant with a cache declaration
//! - Feedstock supplies, transport links (cables, pipes) and a power combiner
//! - A closed registry resolving model identifiers and capabilities
//!
//! All models are deterministic functions of their configuration and inputs.
//!
//! # Example
//!
//! ```
//! use pf_models::{Capability, ModelContext, PlantParams, PortValues, resolve};
//!
//! let ctor = resolve("dummy_wind_turbine", Capability::Performance).unwrap();
//! let ctx = ModelContext::new("wind", serde_yaml::Value::Null, PlantParams::default());
//! let mut turbine = ctor(&ctx).unwrap();
//! let out = turbine.evaluate(&PortValues::new()).unwrap();
//! assert_eq!(out.series("electricity").unwrap().len(), 8760);
//! ```

pub mod ammonia;
pub mod common;
pub mod electrolyzer;
pub mod error;
pub mod feedstock;
pub mod hybrid;
pub mod registry;
pub mod steel;
pub mod storage;
pub mod traits;
pub mod transport;
pub mod wind;

// Re-exports
pub use error::{ModelError, ModelResult, RegistryError, RegistryResult};
pub use feedstock::{FeedstockSource, FeedstockSupply};
pub use hybrid::HybridPlant;
pub use registry::{Capability, Constructor, ModelKind, resolve, resolve_optional};
pub use traits::{CacheSpec, ModelContext, PlantParams, PortValues, SubModel};
pub use transport::{PowerCombiner, TransportLink};
