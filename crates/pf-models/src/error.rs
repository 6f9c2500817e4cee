//! Error types for sub-model construction, evaluation and registry lookup.

use pf_core::CoreError;
use thiserror::Error;

use crate::registry::Capability;

/// Errors raised by a sub-model while being built or evaluated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Missing input '{port}'")]
    MissingInput { port: String },

    #[error("Input '{port}' has the wrong shape: expected {expected}")]
    InputShape { port: String, expected: &'static str },

    #[error("Invalid configuration for {model}: {message}")]
    InvalidConfig { model: String, message: String },

    #[error("{message}")]
    Evaluation { message: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    pub fn evaluation(message: impl Into<String>) -> Self {
        ModelError::Evaluation {
            message: message.into(),
        }
    }

    pub fn invalid_config(model: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::InvalidConfig {
            model: model.into(),
            message: message.into(),
        }
    }
}

/// Registry lookup failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The identifier names no known model kind.
    #[error("Unknown model: '{model}'")]
    UnknownModel { model: String },

    /// The kind exists but does not provide the requested capability.
    #[error("Model '{model}' has no {capability} capability")]
    UnsupportedCapability {
        model: String,
        capability: Capability,
    },
}

pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RegistryError::UnknownModel {
            model: "fusion_reactor".into(),
        };
        assert!(err.to_string().contains("fusion_reactor"));

        let err = ModelError::invalid_config("hydrogen_tank", "total_capacity must be positive");
        assert!(err.to_string().contains("hydrogen_tank"));
    }

    #[test]
    fn core_error_converts() {
        let err: ModelError = CoreError::UnknownUnit { unit: "furlong".into() }.into();
        assert!(matches!(err, ModelError::Core(_)));
    }
}
