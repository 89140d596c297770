//! File-based state store
//!
//! Layout: `<state_dir>/<resource_type>/<id>.json`, one pretty-printed JSON
//! document per record.

use async_trait::async_trait;
use crdform_core::naming;
use std::path::{Path, PathBuf};

use super::StateStore;
use crate::error::{ProviderError, Result};
use crate::state::ResourceState;

/// File-based state store
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_dir`, creating the directory if needed
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory for one resource type; the name must be a single safe segment
    fn type_dir(&self, resource_type: &str) -> Result<PathBuf> {
        if !naming::is_valid_type_name(resource_type) {
            return Err(ProviderError::InvalidResourceTypeName {
                name: resource_type.to_string(),
            });
        }
        Ok(self.base_dir.join(resource_type))
    }

    fn record_path(&self, resource_type: &str, id: u64) -> Result<PathBuf> {
        Ok(self.type_dir(resource_type)?.join(format!("{}.json", id)))
    }

    /// Resource type directories currently present
    fn type_dirs(&self) -> Result<Vec<PathBuf>> {
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(&self.base_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();
        Ok(dirs)
    }

    /// Path of the record with this id, whatever its resource type
    fn find(&self, id: u64) -> Result<Option<PathBuf>> {
        let file_name = format!("{}.json", id);
        Ok(self
            .type_dirs()?
            .into_iter()
            .map(|dir| dir.join(&file_name))
            .find(|p| p.is_file()))
    }

    fn read_state(path: &Path) -> Result<ResourceState> {
        let data = std::fs::read(path)?;
        serde_json::from_slice(&data).map_err(|e| ProviderError::CorruptState {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn remove_record(path: &Path) -> Result<()> {
        std::fs::remove_file(path)?;

        // Clean up empty resource type directory
        if let Some(dir) = path.parent()
            && std::fs::read_dir(dir)?.next().is_none()
        {
            let _ = std::fs::remove_dir(dir);
        }
        Ok(())
    }

    fn write_state(&self, state: &ResourceState) -> Result<()> {
        let path = self.record_path(&state.resource_type, state.id)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStore {
    async fn get(&self, id: u64) -> Result<ResourceState> {
        match self.find(id)? {
            Some(path) => Self::read_state(&path),
            None => Err(ProviderError::StateNotFound { id }),
        }
    }

    async fn list(&self, resource_type: Option<&str>) -> Result<Vec<ResourceState>> {
        let dirs = match resource_type {
            Some(rt) => {
                let dir = self.type_dir(rt)?;
                if dir.is_dir() { vec![dir] } else { vec![] }
            }
            None => self.type_dirs()?,
        };

        let mut states = Vec::new();
        for dir in dirs {
            let files = std::fs::read_dir(&dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|e| e == "json"));

            for file in files {
                match Self::read_state(&file) {
                    Ok(state) => states.push(state),
                    Err(e) => tracing::warn!("Skipping unreadable state file: {}", e),
                }
            }
        }

        states.sort_by_key(|s| s.id);
        Ok(states)
    }

    async fn put(&self, state: &ResourceState) -> Result<()> {
        self.type_dir(&state.resource_type)?;
        if self.find(state.id)?.is_some() {
            return Err(ProviderError::StateAlreadyExists { id: state.id });
        }
        self.write_state(state)
    }

    async fn remove(&self, id: u64) -> Result<ResourceState> {
        let path = self.find(id)?.ok_or(ProviderError::StateNotFound { id })?;
        let state = Self::read_state(&path)?;
        Self::remove_record(&path)?;
        Ok(state)
    }

    async fn purge(&self, id: u64) -> Result<()> {
        let path = self.find(id)?.ok_or(ProviderError::StateNotFound { id })?;
        if let Err(e) = Self::read_state(&path) {
            tracing::warn!("Removing unreadable state file: {}", e);
        }
        Self::remove_record(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn test_state(resource_type: &str, id: u64) -> ResourceState {
        ResourceState {
            id,
            resource_type: resource_type.to_string(),
            api_version: "example.com/v1".to_string(),
            kind: "Widget".to_string(),
            manifest: "apiVersion: example.com/v1\nkind: Widget\n".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_file_store_put_and_get() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path()).unwrap();

        let state = test_state("example_com_widget_v1", 42);
        store.put(&state).await.unwrap();

        assert!(tmp.path().join("example_com_widget_v1/42.json").is_file());
        assert_eq!(store.get(42).await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_file_store_rejects_duplicate_id() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path()).unwrap();

        store.put(&test_state("a_v1", 1)).await.unwrap();
        let err = store.put(&test_state("b_v1", 1)).await.unwrap_err();
        assert!(matches!(err, ProviderError::StateAlreadyExists { id: 1 }));
    }

    #[tokio::test]
    async fn test_file_store_list() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path()).unwrap();

        store.put(&test_state("b_v1", 3)).await.unwrap();
        store.put(&test_state("a_v1", 2)).await.unwrap();
        store.put(&test_state("a_v1", 1)).await.unwrap();

        let all: Vec<u64> = store.list(None).await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(all, vec![1, 2, 3]);

        let filtered = store.list(Some("a_v1")).await.unwrap();
        assert_eq!(filtered.len(), 2);
        assert!(store.list(Some("missing_v1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_list_skips_corrupt_files() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path()).unwrap();

        store.put(&test_state("a_v1", 1)).await.unwrap();
        std::fs::write(tmp.path().join("a_v1/2.json"), "not json").unwrap();

        assert_eq!(store.list(None).await.unwrap().len(), 1);
        let err = store.get(2).await.unwrap_err();
        assert!(matches!(err, ProviderError::CorruptState { .. }));
    }

    #[tokio::test]
    async fn test_file_store_remove() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path()).unwrap();

        store.put(&test_state("a_v1", 7)).await.unwrap();
        let removed = store.remove(7).await.unwrap();
        assert_eq!(removed.id, 7);

        assert!(!tmp.path().join("a_v1").exists());
        assert!(store.get(7).await.unwrap_err().is_not_found());
        assert!(!store.exists(7).await.unwrap());
    }

    #[tokio::test]
    async fn test_file_store_rejects_unsafe_type_names() {
        let tmp = TempDir::new().unwrap();
        let state_dir = tmp.path().join("state");
        let store = FileStore::new(&state_dir).unwrap();

        for name in ["example.com/widget_v1", "..", ""] {
            let err = store.put(&test_state(name, 5)).await.unwrap_err();
            assert!(matches!(err, ProviderError::InvalidResourceTypeName { .. }), "{name}");
        }
        assert!(!tmp.path().join("5.json").exists());
        assert!(std::fs::read_dir(&state_dir).unwrap().next().is_none());
        assert!(store.list(Some("../state")).await.is_err());
    }

    #[tokio::test]
    async fn test_file_store_purge_corrupt_record() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path()).unwrap();

        store.put(&test_state("a_v1", 1)).await.unwrap();
        std::fs::write(tmp.path().join("a_v1/2.json"), "not json").unwrap();
        assert!(matches!(
            store.remove(2).await.unwrap_err(),
            ProviderError::CorruptState { .. }
        ));

        store.purge(2).await.unwrap();
        assert!(!tmp.path().join("a_v1/2.json").exists());
        assert!(store.get(2).await.unwrap_err().is_not_found());
        assert_eq!(store.get(1).await.unwrap().id, 1);
    }
}
