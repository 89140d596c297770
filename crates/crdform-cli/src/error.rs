//! CLI error types with exit code handling
//!
//! Maps core and provider errors to diagnostics and exit codes.

use crdform_core::CoreError;
use crdform_provider::ProviderError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Configuration violates the resource schema
    #[error("Validation failed: {message}")]
    #[diagnostic(code(crdform::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Manifest could not be serialized
    #[error("Serialization failed: {message}")]
    #[diagnostic(code(crdform::cli::serialization))]
    Serialization { message: String },

    /// CRD or schema table could not be loaded
    #[error("Schema error: {message}")]
    #[diagnostic(code(crdform::cli::schema))]
    Schema {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Unknown resource type or state record
    #[error("{message}")]
    #[diagnostic(code(crdform::cli::not_found))]
    NotFound {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid config file or environment override
    #[error("Configuration error: {message}")]
    #[diagnostic(code(crdform::cli::config))]
    Config { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(crdform::cli::io))]
    Io { message: String },

    /// Anything else
    #[error("{message}")]
    #[diagnostic(code(crdform::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Serialization { .. } => exit_codes::SERIALIZATION_ERROR,
            CliError::Schema { .. } => exit_codes::SCHEMA_ERROR,
            CliError::NotFound { .. } => exit_codes::ERROR,
            CliError::Config { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a validation error with help text
    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            help: None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Other {
            message: format!("JSON output failed: {}", err),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => CliError::Validation {
                message: format!("{} violation(s)", errors.len()),
                help: Some(
                    errors
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
            },
            CoreError::Serialization { .. } => CliError::Serialization {
                message: err.to_string(),
            },
            CoreError::UnknownResourceType { ref name } => CliError::NotFound {
                help: Some(format!(
                    "Run `crdform list` to see loaded resource types (looked for '{}')",
                    name
                )),
                message: err.to_string(),
            },
            CoreError::InvalidManifest { .. } => CliError::Other {
                message: err.to_string(),
            },
            CoreError::Io(e) => CliError::from(e),
            CoreError::InvalidSchema { .. }
            | CoreError::InvalidCrd { .. }
            | CoreError::DuplicateResourceType { .. }
            | CoreError::YamlParse(_)
            | CoreError::JsonParse(_)
            | CoreError::Walk(_) => CliError::schema(err.to_string()),
        }
    }
}

impl From<ProviderError> for CliError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Core(e) => CliError::from(e),
            ProviderError::StateNotFound { .. } => CliError::NotFound {
                message: err.to_string(),
                help: Some("Run `crdform state list` to see stored records".to_string()),
            },
            ProviderError::InvalidConfig { message } => CliError::Config { message },
            ProviderError::Io(e) => CliError::from(e),
            other => CliError::Other {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
