//! Resource type registry
//!
//! The registry is the table every crdform operation dispatches through. It is
//! populated from CRD manifests or from schema table files:
//!
//! ```yaml
//! resources:
//!   - name: example_com_widget_v1
//!     apiVersion: example.com/v1
//!     kind: Widget
//!     schema:
//!       fields:
//!         - name: spec
//!           type: object
//!           fields:
//!             - name: size
//!               type: integer
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use walkdir::WalkDir;

use crate::crd::CrdLoader;
use crate::error::{CoreError, Result};
use crate::naming;
use crate::schema::ResourceSchema;

/// One projectable resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceType {
    /// Type name, e.g. `chaos_mesh_org_pod_network_chaos_v1alpha1`
    pub name: String,
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: ResourceSchema,
}

/// Schema table file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaTable {
    #[serde(default)]
    pub resources: Vec<ResourceType>,
}

/// What a load call registered
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    /// Names of registered resource types, in load order
    pub loaded: Vec<String>,
    pub warnings: Vec<String>,
}

impl LoadOutcome {
    fn merge(&mut self, other: LoadOutcome) {
        self.loaded.extend(other.loaded);
        self.warnings.extend(other.warnings);
    }
}

/// Ordered table of resource types keyed by name
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    types: IndexMap<String, ResourceType>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type after checking its schema
    ///
    /// Names must be non-empty `[a-z0-9_]`; they double as state directory names.
    pub fn register(&mut self, resource: ResourceType) -> Result<()> {
        if !naming::is_valid_type_name(&resource.name) {
            return Err(CoreError::InvalidSchema {
                message: format!(
                    "resource type name '{}' must be non-empty and use only [a-z0-9_]",
                    resource.name
                ),
            });
        }

        resource.schema.verify().map_err(|e| match e {
            CoreError::InvalidSchema { message } => CoreError::InvalidSchema {
                message: format!("{}: {}", resource.name, message),
            },
            other => other,
        })?;

        if self.types.contains_key(&resource.name) {
            return Err(CoreError::DuplicateResourceType {
                name: resource.name,
            });
        }

        self.types.insert(resource.name.clone(), resource);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ResourceType> {
        self.types.get(name)
    }

    /// Look up a resource type, failing if it is not registered
    pub fn require(&self, name: &str) -> Result<&ResourceType> {
        self.get(name).ok_or_else(|| CoreError::UnknownResourceType {
            name: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceType> {
        self.types.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Load CRD documents or a schema table from YAML text
    ///
    /// `origin` names the source in warnings and errors.
    pub fn load_str(&mut self, content: &str, origin: &str) -> Result<LoadOutcome> {
        let mut outcome = LoadOutcome::default();

        for doc in serde_yaml::Deserializer::from_str(content) {
            let value = JsonValue::deserialize(doc)?;
            if value.is_null() {
                continue;
            }

            let resources = if CrdLoader::is_crd(&value) {
                let parsed = CrdLoader::parse_value(&value)?;
                outcome.warnings.extend(parsed.warnings);
                parsed.resources
            } else if value.get("resources").is_some() {
                let table: SchemaTable = serde_json::from_value(value).map_err(|e| {
                    CoreError::InvalidSchema {
                        message: format!("{}: {}", origin, e),
                    }
                })?;
                table.resources
            } else {
                outcome.warnings.push(format!(
                    "{}: skipping document that is neither a CRD nor a schema table",
                    origin
                ));
                continue;
            };

            for resource in resources {
                let name = resource.name.clone();
                self.register(resource)?;
                outcome.loaded.push(name);
            }
        }

        Ok(outcome)
    }

    /// Load a single YAML file
    pub fn load_file(&mut self, path: &Path) -> Result<LoadOutcome> {
        let content = std::fs::read_to_string(path)?;
        self.load_str(&content, &path.display().to_string())
    }

    /// Load a file, or every `.yaml`/`.yml` file under a directory
    ///
    /// Directory entries are visited in file name order.
    pub fn load_path(&mut self, path: &Path) -> Result<LoadOutcome> {
        if path.is_file() {
            return self.load_file(path);
        }
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("schema path not found: {}", path.display()),
            )
            .into());
        }

        let mut outcome = LoadOutcome::default();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && is_yaml(entry.path()) {
                outcome.merge(self.load_file(entry.path())?);
            }
        }
        Ok(outcome)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == "yaml" || e == "yml")
}
