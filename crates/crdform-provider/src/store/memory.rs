//! In-memory state store
//!
//! Keeps records in a map behind a lock. Used by tests and by `render`-style
//! dry runs that must not touch the state directory.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::StateStore;
use crate::error::{ProviderError, Result};
use crate::state::ResourceState;

/// In-memory state store
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// Storage: id -> record
    records: Arc<RwLock<BTreeMap<u64, ResourceState>>>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub lists: usize,
    pub puts: usize,
    pub removes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-populated records
    pub fn with_states(states: Vec<ResourceState>) -> Self {
        let records = states.into_iter().map(|s| (s.id, s)).collect();
        Self {
            records: Arc::new(RwLock::new(records)),
            operations: Arc::default(),
        }
    }

    /// Get operation counts for assertions
    pub async fn operation_counts(&self) -> OperationCounts {
        self.operations.read().await.clone()
    }

    pub async fn reset_counts(&self) {
        *self.operations.write().await = OperationCounts::default();
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, id: u64) -> Result<ResourceState> {
        self.operations.write().await.gets += 1;

        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ProviderError::StateNotFound { id })
    }

    async fn list(&self, resource_type: Option<&str>) -> Result<Vec<ResourceState>> {
        self.operations.write().await.lists += 1;

        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|s| resource_type.is_none_or(|rt| rt == s.resource_type))
            .cloned()
            .collect())
    }

    async fn put(&self, state: &ResourceState) -> Result<()> {
        self.operations.write().await.puts += 1;

        let mut records = self.records.write().await;
        if records.contains_key(&state.id) {
            return Err(ProviderError::StateAlreadyExists { id: state.id });
        }
        records.insert(state.id, state.clone());
        Ok(())
    }

    async fn remove(&self, id: u64) -> Result<ResourceState> {
        self.operations.write().await.removes += 1;

        self.records
            .write()
            .await
            .remove(&id)
            .ok_or(ProviderError::StateNotFound { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_state(resource_type: &str, id: u64) -> ResourceState {
        ResourceState {
            id,
            resource_type: resource_type.to_string(),
            api_version: "v1".to_string(),
            kind: "Widget".to_string(),
            manifest: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let state = test_state("a_v1", 1);

        store.put(&state).await.unwrap();
        assert_eq!(store.get(1).await.unwrap(), state);
        assert_eq!(store.remove(1).await.unwrap(), state);
        assert!(store.is_empty().await);

        let counts = store.operation_counts().await;
        assert_eq!(counts.puts, 1);
        assert_eq!(counts.gets, 1);
        assert_eq!(counts.removes, 1);
    }

    #[tokio::test]
    async fn test_memory_store_list_filter() {
        let store = MemoryStore::with_states(vec![
            test_state("a_v1", 3),
            test_state("b_v1", 1),
            test_state("a_v1", 2),
        ]);

        let ids: Vec<u64> = store.list(Some("a_v1")).await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(store.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_memory_store_errors() {
        let store = MemoryStore::with_states(vec![test_state("a_v1", 1)]);

        assert!(matches!(
            store.put(&test_state("a_v1", 1)).await,
            Err(ProviderError::StateAlreadyExists { id: 1 })
        ));
        assert!(store.remove(5).await.unwrap_err().is_not_found());
        assert!(store.exists(1).await.unwrap());

        store.reset_counts().await;
        assert_eq!(store.operation_counts().await, OperationCounts::default());
    }
}
