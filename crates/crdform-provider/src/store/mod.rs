//! State stores for projected resources
//!
//! - **File** (default): one JSON file per record under a state directory
//! - **Memory**: in-process map, for tests and dry runs
//!
//! Stores persist `ResourceState` and return it verbatim. They never talk to
//! a cluster.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::{MemoryStore, OperationCounts};

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::state::ResourceState;

/// Persistence for resource state records
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get a record by id
    async fn get(&self, id: u64) -> Result<ResourceState>;

    /// List records, optionally filtered by resource type, ordered by id
    async fn list(&self, resource_type: Option<&str>) -> Result<Vec<ResourceState>>;

    /// Store a new record
    async fn put(&self, state: &ResourceState) -> Result<()>;

    /// Remove a record, returning what was stored
    async fn remove(&self, id: u64) -> Result<ResourceState>;

    /// Remove a record without decoding it, for records `get` cannot read
    async fn purge(&self, id: u64) -> Result<()> {
        self.remove(id).await.map(|_| ())
    }

    /// Check if a record exists
    async fn exists(&self, id: u64) -> Result<bool> {
        match self.get(id).await {
            Ok(_) => Ok(true),
            Err(ProviderError::StateNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
