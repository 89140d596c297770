//! Error types for crdform-provider

use crdform_core::CoreError;
use thiserror::Error;

/// Result type for crdform-provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors raised by handlers, state stores and configuration loading
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// Schema, validation or projection failure
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No record with this identifier
    #[error("no state record with id {id}")]
    StateNotFound { id: u64 },

    /// A record with this identifier is already stored
    #[error("state record {id} already exists")]
    StateAlreadyExists { id: u64 },

    /// State belongs to a different resource type than the handler
    #[error("state record {id} belongs to '{found}', not '{expected}'")]
    ResourceTypeMismatch {
        id: u64,
        expected: String,
        found: String,
    },

    /// Resource type name cannot be used as a state directory
    #[error("resource type name '{name}' cannot be stored: use only [a-z0-9_]")]
    InvalidResourceTypeName { name: String },

    /// State file could not be decoded
    #[error("corrupt state file {path}: {message}")]
    CorruptState { path: String, message: String },

    /// Invalid configuration
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for ProviderError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl ProviderError {
    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::StateNotFound { .. })
    }

    /// The underlying core error, if any
    pub fn core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(e) => Some(e),
            _ => None,
        }
    }
}
