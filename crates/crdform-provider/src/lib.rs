//! crdform Provider - resource lifecycle on top of crdform-core
//!
//! This crate provides:
//! - `ResourceHandler`: create/update/read/delete for any registered type
//! - `Provider`: registry, projector and state store wired together
//! - `StateStore`: persistence trait with file and in-memory drivers
//! - `ProviderConfig`: config file discovery and environment overrides

pub mod config;
pub mod error;
pub mod handler;
pub mod provider;
pub mod state;
pub mod store;

pub use config::ProviderConfig;
pub use error::{ProviderError, Result};
pub use handler::ResourceHandler;
pub use provider::{Provider, load_registry};
pub use state::ResourceState;
pub use store::{FileStore, MemoryStore, OperationCounts, StateStore};
