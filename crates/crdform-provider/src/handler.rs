//! Resource handlers
//!
//! One generic handler serves every resource type: decode the configuration,
//! validate it against the type's schema, project it, persist the record.
//! Nothing is persisted when any step fails.

use crdform_core::{
    ConfigurationTree, CoreError, ManifestRecord, Projector, ResourceType, decode_validated,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::error::{ProviderError, Result};
use crate::state::ResourceState;
use crate::store::StateStore;

/// CRUD operations for one resource type
#[derive(Clone)]
pub struct ResourceHandler {
    resource: Arc<ResourceType>,
    projector: Projector,
    store: Arc<dyn StateStore>,
}

impl ResourceHandler {
    pub fn new(resource: Arc<ResourceType>, projector: Projector, store: Arc<dyn StateStore>) -> Self {
        Self {
            resource,
            projector,
            store,
        }
    }

    pub fn resource_type(&self) -> &ResourceType {
        &self.resource
    }

    /// Decode and validate configuration, collecting every violation
    pub fn validate_config(&self, config: &JsonValue) -> Result<ConfigurationTree> {
        decode_validated(&self.resource.schema, config)
            .map_err(|e| CoreError::from(e).into())
    }

    /// Validate and project without touching the store
    pub fn plan(&self, config: &JsonValue) -> Result<ManifestRecord> {
        let tree = self.validate_config(config)?;
        let record = self.projector.project(
            &self.resource.schema,
            &tree,
            &self.resource.api_version,
            &self.resource.kind,
        )?;
        Ok(record)
    }

    /// Project a new record and persist it
    pub async fn create(&self, config: &JsonValue) -> Result<ResourceState> {
        let state = ResourceState::from_record(&self.resource.name, self.plan(config)?);
        self.store.put(&state).await?;

        tracing::info!(
            id = state.id,
            resource_type = %self.resource.name,
            "Created resource record"
        );
        Ok(state)
    }

    /// Replace a prior record with a freshly projected one
    ///
    /// The new record gets a new id. The prior record is removed only after
    /// the new one is stored.
    pub async fn update(&self, prior_id: u64, config: &JsonValue) -> Result<ResourceState> {
        let record = self.plan(config)?;

        let prior = self.store.get(prior_id).await?;
        self.check_owned(&prior)?;

        let state = ResourceState::from_record(&self.resource.name, record);
        self.store.put(&state).await?;

        if let Err(e) = self.store.remove(prior_id).await {
            tracing::warn!(id = state.id, "Rolling back new record: {}", e);
            if let Err(rollback) = self.store.remove(state.id).await {
                tracing::error!(id = state.id, "Rollback failed, record left in state: {}", rollback);
            }
            return Err(e);
        }

        tracing::info!(
            id = state.id,
            replaced = prior_id,
            resource_type = %self.resource.name,
            "Updated resource record"
        );
        Ok(state)
    }

    /// Return the stored state unchanged
    ///
    /// There is no remote object to refresh from.
    pub async fn read(&self, state: ResourceState) -> Result<ResourceState> {
        self.check_owned(&state)?;
        Ok(state)
    }

    /// Remove a record from the local store
    pub async fn delete(&self, state: &ResourceState) -> Result<ResourceState> {
        self.check_owned(state)?;
        let removed = self.store.remove(state.id).await?;

        tracing::info!(
            id = removed.id,
            resource_type = %self.resource.name,
            "Deleted resource record"
        );
        Ok(removed)
    }

    fn check_owned(&self, state: &ResourceState) -> Result<()> {
        if state.resource_type != self.resource.name {
            return Err(ProviderError::ResourceTypeMismatch {
                id: state.id,
                expected: self.resource.name.clone(),
                found: state.resource_type.clone(),
            });
        }
        Ok(())
    }
}
