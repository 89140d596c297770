//! Persisted resource state

use chrono::{DateTime, Utc};
use crdform_core::ManifestRecord;
use serde::{Deserialize, Serialize};

/// One projected resource as kept by a state store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceState {
    pub id: u64,

    /// Resource type name, e.g. `chaos_mesh_org_pod_network_chaos_v1alpha1`
    pub resource_type: String,

    pub api_version: String,

    pub kind: String,

    /// Manifest text, returned verbatim
    pub manifest: String,

    pub created_at: DateTime<Utc>,
}

impl ResourceState {
    /// Wrap a fresh projection
    pub fn from_record(resource_type: impl Into<String>, record: ManifestRecord) -> Self {
        Self {
            id: record.id,
            resource_type: resource_type.into(),
            api_version: record.api_version,
            kind: record.kind,
            manifest: record.manifest,
            created_at: Utc::now(),
        }
    }

    /// Value of `metadata.name` in the manifest, if set
    pub fn name(&self) -> Option<String> {
        let doc: serde_yaml::Value = serde_yaml::from_str(&self.manifest).ok()?;
        doc.get("metadata")?
            .get("name")?
            .as_str()
            .map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_record() {
        let record = ManifestRecord {
            id: 9,
            api_version: "example.com/v1".to_string(),
            kind: "Widget".to_string(),
            manifest: "apiVersion: example.com/v1\nkind: Widget\nmetadata:\n  name: demo\n".to_string(),
        };
        let state = ResourceState::from_record("example_com_widget_v1", record);

        assert_eq!(state.id, 9);
        assert_eq!(state.resource_type, "example_com_widget_v1");
        assert_eq!(state.name().as_deref(), Some("demo"));
    }

    #[test]
    fn test_json_layout() {
        let state = ResourceState {
            id: 1,
            resource_type: "t_v1".to_string(),
            api_version: "v1".to_string(),
            kind: "T".to_string(),
            manifest: String::new(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("resourceType").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(state.name(), None);
    }
}
