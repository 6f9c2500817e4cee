//! Plant composition engine for plantflow.
//!
//! This crate turns a project into an evaluated plant: it instantiates
//! technology nodes from the model registry, resolves interconnections
//! (inserting transport nodes where asked), fans costs into the financial
//! aggregator, schedules the graph and runs every node in order, serving
//! expensive sub-simulations from the cache.

pub mod error;
pub mod evaluate;
pub mod node;
pub mod plant_compile;
pub mod project_service;
pub mod resolver;
pub mod run_service;

// Re-export key types for convenience
pub use error::{AppError, AppResult};
pub use evaluate::PlantResults;
pub use node::{NodeBody, NodeOutputs, TechnologyNode};
pub use plant_compile::{Plant, attach_aggregator, compile_plant, instantiate_technology};
pub use project_service::{
    TechnologySummary, list_technologies, load_project, save_project, validate_project,
};
pub use resolver::{Connection, resolve_connection};
pub use run_service::{
    Engine, EngineOptions, RunResponse, RunTiming, clear_cache, list_cache, run_project,
};
