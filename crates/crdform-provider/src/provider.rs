//! Provider: registry, projector and state store wired together
//!
//! Dispatches CRUD requests to the generic handler by resource type name.

use crdform_core::{LoadOutcome, Projector, ResourceRegistry};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::handler::ResourceHandler;
use crate::state::ResourceState;
use crate::store::{FileStore, StateStore};

pub struct Provider {
    registry: ResourceRegistry,
    projector: Projector,
    store: Arc<dyn StateStore>,
}

impl Provider {
    pub fn new(registry: ResourceRegistry, projector: Projector, store: Arc<dyn StateStore>) -> Self {
        Self {
            registry,
            projector,
            store,
        }
    }

    /// Build from configuration, loading every schema path
    ///
    /// `extra_schema_paths` are loaded after the configured ones.
    pub fn from_config(
        config: &ProviderConfig,
        extra_schema_paths: &[PathBuf],
    ) -> Result<(Self, LoadOutcome)> {
        let paths: Vec<PathBuf> = config
            .schema_paths
            .iter()
            .chain(extra_schema_paths)
            .cloned()
            .collect();
        let (registry, outcome) = load_registry(&paths)?;

        let store = FileStore::new(&config.state_dir)?;
        tracing::debug!("Using state directory {}", config.state_dir.display());

        Ok((Self::new(registry, config.projector(), Arc::new(store)), outcome))
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Handler for a registered resource type
    pub fn handler(&self, resource_type: &str) -> Result<ResourceHandler> {
        let resource = self.registry.require(resource_type)?.clone();
        Ok(ResourceHandler::new(
            Arc::new(resource),
            self.projector.clone(),
            self.store.clone(),
        ))
    }

    pub async fn create(&self, resource_type: &str, config: &JsonValue) -> Result<ResourceState> {
        self.handler(resource_type)?.create(config).await
    }

    pub async fn update(
        &self,
        resource_type: &str,
        prior_id: u64,
        config: &JsonValue,
    ) -> Result<ResourceState> {
        self.handler(resource_type)?.update(prior_id, config).await
    }

    /// Stored state for an id
    pub async fn read(&self, id: u64) -> Result<ResourceState> {
        let state = self.store.get(id).await?;
        self.handler(&state.resource_type)?.read(state).await
    }

    /// Remove a record from the local store
    ///
    /// Records whose resource type is no longer loaded can still be removed.
    pub async fn delete(&self, id: u64) -> Result<ResourceState> {
        let state = self.store.get(id).await?;
        match self.registry.get(&state.resource_type) {
            Some(_) => self.handler(&state.resource_type)?.delete(&state).await,
            None => {
                tracing::warn!(
                    id,
                    resource_type = %state.resource_type,
                    "Removing record of an unloaded resource type"
                );
                self.store.remove(id).await
            }
        }
    }

    /// Remove a record whose state file can no longer be decoded
    pub async fn purge(&self, id: u64) -> Result<()> {
        self.store.purge(id).await?;
        tracing::warn!(id, "Purged unreadable state record");
        Ok(())
    }

    pub async fn list(&self, resource_type: Option<&str>) -> Result<Vec<ResourceState>> {
        self.store.list(resource_type).await
    }
}

/// Load resource types from every path in order
pub fn load_registry(paths: &[PathBuf]) -> Result<(ResourceRegistry, LoadOutcome)> {
    let mut registry = ResourceRegistry::new();
    let mut outcome = LoadOutcome::default();

    for path in paths {
        tracing::debug!("Loading schemas from {}", path.display());
        let loaded = registry.load_path(path)?;
        for warning in &loaded.warnings {
            tracing::warn!("{}", warning);
        }
        tracing::debug!("Loaded {} resource type(s) from {}", loaded.loaded.len(), path.display());
        outcome.loaded.extend(loaded.loaded);
        outcome.warnings.extend(loaded.warnings);
    }

    Ok((registry, outcome))
}
