//! Error types for the pf-app engine.

use pf_cache::CacheError;
use pf_graph::GraphError;
use pf_models::RegistryError;

/// Engine error covering plant assembly, scheduling and evaluation.
///
/// Structural errors (`UnknownModel`, `InvalidConnection`, `CyclicGraph`,
/// `Config`, `Graph`) surface during assembly, before any model runs.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unknown model '{model}' ({context})")]
    UnknownModel { model: String, context: String },

    #[error("Invalid connection {connection:?}: {reason}")]
    InvalidConnection {
        connection: Vec<String>,
        reason: String,
    },

    #[error("Cyclic dependency between technologies: {}", .cycle.join(" -> "))]
    CyclicGraph { cycle: Vec<String> },

    #[error("Model evaluation failed in '{node}': {message}")]
    ModelEvaluation { node: String, message: String },

    #[error("Corrupt cache entry {key}: {reason}")]
    CacheCorruption { key: String, reason: String },

    #[error("Configuration error in '{technology}': {message}")]
    Config { technology: String, message: String },

    #[error("Graph error: {0}")]
    Graph(GraphError),

    #[error("Project error: {0}")]
    Project(String),

    #[error("Finance error: {0}")]
    Finance(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn config(technology: impl Into<String>, message: impl ToString) -> Self {
        AppError::Config {
            technology: technology.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid_connection(connection: &[String], reason: impl ToString) -> Self {
        AppError::InvalidConnection {
            connection: connection.to_vec(),
            reason: reason.to_string(),
        }
    }

    /// Map a registry miss for `technology`'s `slot`.
    pub fn registry(err: RegistryError, technology: &str, slot: &str) -> Self {
        match err {
            RegistryError::UnknownModel { model } => AppError::UnknownModel {
                model,
                context: format!("{} of '{}'", slot, technology),
            },
            other => AppError::config(technology, other),
        }
    }
}

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::CyclicGraph { cycle } => AppError::CyclicGraph { cycle },
            other => AppError::Graph(other),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Corrupt { key, reason } => AppError::CacheCorruption { key, reason },
            CacheError::Io(e) => AppError::Io(e),
            other => AppError::Cache(other.to_string()),
        }
    }
}

impl From<pf_project::ProjectError> for AppError {
    fn from(err: pf_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<pf_finance::FinanceError> for AppError {
    fn from(err: pf_finance::FinanceError) -> Self {
        AppError::Finance(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_maps_to_its_own_variant() {
        let err: AppError = GraphError::CyclicGraph {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        }
        .into();
        assert!(matches!(err, AppError::CyclicGraph { .. }));
        assert_eq!(
            err.to_string(),
            "Cyclic dependency between technologies: a -> b -> a"
        );
    }

    #[test]
    fn corrupt_cache_keeps_key() {
        let err: AppError = CacheError::Corrupt {
            key: "abc".into(),
            reason: "truncated".into(),
        }
        .into();
        assert!(matches!(err, AppError::CacheCorruption { ref key, .. } if key == "abc"));
    }

    #[test]
    fn invalid_connection_shows_tuple() {
        let tuple = vec!["wind".to_string(), "electrolyzer".to_string()];
        let err = AppError::invalid_connection(&tuple, "expected 3 or 4 entries");
        assert!(err.to_string().contains(r#"["wind", "electrolyzer"]"#));
    }
}
