//! Core error types

use thiserror::Error;

use crate::validate::ValidationErrors;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("Invalid CRD: {message}")]
    InvalidCrd { message: String },

    #[error("Invalid manifest: {message}")]
    InvalidManifest { message: String },

    #[error("Unknown resource type: {name}")]
    UnknownResourceType { name: String },

    #[error("Resource type '{name}' is already registered")]
    DuplicateResourceType { name: String },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Failed to serialize {kind} manifest: {cause}")]
    Serialization { kind: String, cause: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to walk schema directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl CoreError {
    /// Violations carried by a validation failure, if this is one
    pub fn violations(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
