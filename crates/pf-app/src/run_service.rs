//! Run execution service: compile, schedule and evaluate a project.

use std::path::{Path, PathBuf};
use std::time::Instant;

use pf_cache::{CacheEntry, CacheStore};
use pf_project::Project;
use tracing::info;

use crate::error::AppResult;
use crate::evaluate::PlantResults;
use crate::plant_compile::{Plant, compile_plant};
use crate::project_service;

/// Engine configuration, passed explicitly at construction.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub use_cache: bool,
    /// Cache directory; defaults to `<project dir>/.plantflow/cache` when a
    /// project path is known.
    pub cache_dir: Option<PathBuf>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_dir: None,
        }
    }
}

impl EngineOptions {
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }
}

/// Wall-clock timings of one run.
#[derive(Debug, Clone, Default)]
pub struct RunTiming {
    pub compile_time_s: f64,
    pub evaluate_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub project_name: String,
    pub results: PlantResults,
    /// Cache directory used, if any.
    pub cache_dir: Option<PathBuf>,
    pub timing: RunTiming,
}

/// Plant composition engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Assemble and schedule `project` without evaluating it.
    pub fn assemble(&self, project: &Project) -> AppResult<Plant> {
        compile_plant(project)
    }

    /// Cache store for a project at `project_path`, honouring the options.
    pub fn cache_store(&self, project_path: Option<&Path>) -> AppResult<Option<CacheStore>> {
        if !self.options.use_cache {
            return Ok(None);
        }
        let store = match (&self.options.cache_dir, project_path) {
            (Some(dir), _) => CacheStore::new(dir.clone())?,
            (None, Some(path)) => CacheStore::for_project(path)?,
            (None, None) => return Ok(None),
        };
        Ok(Some(store))
    }

    /// Assemble, schedule and evaluate `project`.
    ///
    /// `project_path` locates the project-local cache when no cache
    /// directory is configured.
    pub fn run(&self, project: &Project, project_path: Option<&Path>) -> AppResult<RunResponse> {
        let started = Instant::now();
        let cache = self.cache_store(project_path)?;

        let compile_start = Instant::now();
        let mut plant = self.assemble(project)?;
        let compile_time_s = compile_start.elapsed().as_secs_f64();
        info!(project = %project.name, order = ?plant.order(), "schedule ready");

        let evaluate_start = Instant::now();
        let results = plant.evaluate(cache.as_ref())?;
        let evaluate_time_s = evaluate_start.elapsed().as_secs_f64();

        Ok(RunResponse {
            project_name: project.name.clone(),
            results,
            cache_dir: cache.map(|c| c.root().to_path_buf()),
            timing: RunTiming {
                compile_time_s,
                evaluate_time_s,
                total_time_s: started.elapsed().as_secs_f64(),
            },
        })
    }
}

/// Load the project at `project_path` and run it.
pub fn run_project(project_path: &Path, options: EngineOptions) -> AppResult<RunResponse> {
    let project = project_service::load_project(project_path)?;
    Engine::new(options).run(&project, Some(project_path))
}

/// Entries in the cache of the project at `project_path`.
pub fn list_cache(project_path: &Path, options: &EngineOptions) -> AppResult<Vec<CacheEntry>> {
    let store = match &options.cache_dir {
        Some(dir) => CacheStore::new(dir.clone())?,
        None => CacheStore::for_project(project_path)?,
    };
    Ok(store.list()?)
}

/// Remove every entry from the cache of the project at `project_path`.
pub fn clear_cache(project_path: &Path, options: &EngineOptions) -> AppResult<usize> {
    let store = match &options.cache_dir {
        Some(dir) => CacheStore::new(dir.clone())?,
        None => CacheStore::for_project(project_path)?,
    };
    let removed = store.clear()?;
    info!(removed, dir = %store.root().display(), "cleared cache");
    Ok(removed)
}
