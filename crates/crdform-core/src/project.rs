//! Manifest projection
//!
//! Turns a configuration tree into a `ManifestRecord`: a fresh identifier and
//! a YAML manifest stamped with the resource type's identity constants.
//!
//! Output shape:
//! - `apiVersion` and `kind` come first and always hold the constants passed
//!   in; root-level values of those keys in the tree are never emitted
//! - fields follow schema declaration order under their external names
//! - absent fields, and objects with no present children, are omitted
//! - lists keep input order, map keys keep input order unless
//!   `sort_map_keys` is set
//!
//! Projection is pure apart from reading the identifier source: it performs
//! no I/O and holds no shared mutable state.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value as YamlValue};
use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::id::{IdGenerator, IdPolicy, WallClock};
use crate::schema::{Field, FieldType, IDENTITY_KEYS, ResourceSchema};
use crate::tree::{ConfigurationTree, Object, Value};
use crate::validate::{child_path, index_path};

/// Output of one projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRecord {
    pub id: u64,
    pub api_version: String,
    pub kind: String,
    /// Serialized YAML manifest
    pub manifest: String,
}

/// Output formatting options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectOptions {
    /// Emit map-of-string entries in sorted key order instead of input order
    pub sort_map_keys: bool,
}

/// Reusable projector bound to an identifier policy
#[derive(Debug, Clone)]
pub struct Projector {
    ids: Arc<dyn IdGenerator>,
    options: ProjectOptions,
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(WallClock)
    }
}

impl Projector {
    pub fn new(ids: impl IdGenerator + 'static) -> Self {
        Self {
            ids: Arc::new(ids),
            options: ProjectOptions::default(),
        }
    }

    pub fn from_policy(policy: IdPolicy) -> Self {
        Self {
            ids: Arc::from(policy.generator()),
            options: ProjectOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ProjectOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ProjectOptions {
        self.options
    }

    /// Project a tree into a new record with a fresh identifier
    pub fn project(
        &self,
        schema: &ResourceSchema,
        tree: &ConfigurationTree,
        api_version: &str,
        kind: &str,
    ) -> Result<ManifestRecord> {
        let id = self.ids.next_id();
        let manifest = self.render(schema, tree, api_version, kind)?;

        Ok(ManifestRecord {
            id,
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            manifest,
        })
    }

    /// Render the manifest text only
    pub fn render(
        &self,
        schema: &ResourceSchema,
        tree: &ConfigurationTree,
        api_version: &str,
        kind: &str,
    ) -> Result<String> {
        let serialization_error = |cause: String| CoreError::Serialization {
            kind: kind.to_string(),
            cause,
        };

        let mut doc = Mapping::new();
        doc.insert(
            YamlValue::from("apiVersion"),
            YamlValue::from(api_version),
        );
        doc.insert(YamlValue::from("kind"), YamlValue::from(kind));

        let body = self
            .object(&schema.fields, tree, "")
            .map_err(serialization_error)?;
        for (key, value) in body {
            if key.as_str().is_some_and(|k| IDENTITY_KEYS.contains(&k)) {
                continue;
            }
            doc.insert(key, value);
        }

        serde_yaml::to_string(&YamlValue::Mapping(doc))
            .map_err(|e| serialization_error(e.to_string()))
    }

    fn object(&self, fields: &[Field], obj: &Object, path: &str) -> std::result::Result<Mapping, String> {
        let mut out = Mapping::new();
        for field in fields {
            let Some(value) = obj.get(&field.name) else {
                continue;
            };
            if value.is_absent() {
                continue;
            }
            let field_path = child_path(path, &field.name);
            let rendered = self.value(&field.field_type, value, &field_path)?;
            out.insert(YamlValue::String(field.key().into_owned()), rendered);
        }
        Ok(out)
    }

    fn value(&self, field_type: &FieldType, value: &Value, path: &str) -> std::result::Result<YamlValue, String> {
        match (field_type, value) {
            (FieldType::String, Value::String(s)) => Ok(YamlValue::String(s.clone())),
            (FieldType::Integer | FieldType::Number, Value::Integer(n)) => {
                Ok(YamlValue::Number((*n).into()))
            }
            (FieldType::Number, Value::Number(n)) => {
                if n.is_finite() {
                    Ok(YamlValue::Number((*n).into()))
                } else {
                    Err(format!("non-finite number {} at {}", n, path))
                }
            }
            (FieldType::Boolean, Value::Bool(b)) => Ok(YamlValue::Bool(*b)),
            (FieldType::List { items }, Value::List(values)) => values
                .iter()
                .enumerate()
                .map(|(i, item)| self.value(items, item, &index_path(path, i)))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(YamlValue::Sequence),
            (FieldType::ObjectList { fields }, Value::List(values)) => values
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let item_path = index_path(path, i);
                    match item {
                        Value::Object(obj) => self.object(fields, obj, &item_path).map(YamlValue::Mapping),
                        other => Err(format!(
                            "{} at {} does not match schema type object",
                            other.type_name(),
                            item_path
                        )),
                    }
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(YamlValue::Sequence),
            (FieldType::Map, Value::Map(entries)) => {
                let mut keys: Vec<&String> = entries.keys().collect();
                if self.options.sort_map_keys {
                    keys.sort();
                }
                let mut out = Mapping::new();
                for key in keys {
                    out.insert(
                        YamlValue::String(key.clone()),
                        YamlValue::String(entries[key].clone()),
                    );
                }
                Ok(YamlValue::Mapping(out))
            }
            (FieldType::Object { fields }, Value::Object(obj)) => {
                self.object(fields, obj, path).map(YamlValue::Mapping)
            }
            (expected, other) => Err(format!(
                "{} at {} does not match schema type {}",
                other.type_name(),
                path,
                expected
            )),
        }
    }
}

/// Project with the default wall-clock identifier policy
pub fn project(
    schema: &ResourceSchema,
    tree: &ConfigurationTree,
    api_version: &str,
    kind: &str,
) -> Result<ManifestRecord> {
    Projector::default().project(schema, tree, api_version, kind)
}
