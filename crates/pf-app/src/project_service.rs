//! Project loading, saving, validation, and introspection.

use std::path::Path;

use pf_project::{Project, TechnologyDef};

use crate::error::AppResult;

/// Summary of a technology for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnologySummary {
    pub name: String,
    pub performance_model: Option<String>,
    pub cost_model: Option<String>,
    pub financial_model: Option<String>,
    pub feedstocks: Vec<String>,
}

/// Load and validate a project from a YAML file.
pub fn load_project(path: &Path) -> AppResult<Project> {
    Ok(pf_project::load_yaml(path)?)
}

/// Validate and save a project to a YAML file.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    Ok(pf_project::save_yaml(path, project)?)
}

/// Validate project structure.
pub fn validate_project(project: &Project) -> AppResult<()> {
    pf_project::validate_project(project).map_err(pf_project::ProjectError::from)?;
    Ok(())
}

fn summarize(tech: &TechnologyDef) -> TechnologySummary {
    TechnologySummary {
        name: tech.name.clone(),
        performance_model: tech.performance_model.as_ref().map(|m| m.model.clone()),
        cost_model: tech.cost_model.as_ref().map(|m| m.model.clone()),
        financial_model: tech.financial_model.as_ref().map(|m| m.model.clone()),
        feedstocks: tech.feedstocks.iter().map(|f| f.name.clone()).collect(),
    }
}

/// List all technologies in configuration order.
pub fn list_technologies(project: &Project) -> Vec<TechnologySummary> {
    project.technologies.iter().map(summarize).collect()
}
