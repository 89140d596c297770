//! CRD loader
//!
//! Turns `apiextensions.k8s.io/v1` CustomResourceDefinition manifests into
//! resource types: one per served version that carries an `openAPIV3Schema`.
//!
//! Only `metadata` and the user-facing root properties (usually `spec`) are
//! kept. `metadata` is reduced to `name`, `namespace` (namespaced CRDs only),
//! `labels` and `annotations`; `apiVersion`, `kind` and `status` are dropped.
//!
//! Property mapping:
//! - `object` with properties → nested object
//! - `object` without properties (free-form or `additionalProperties`) → map
//! - `array` of objects → object list, other arrays → list
//! - `x-kubernetes-int-or-string` → string
//! - `minimum`/`maximum`/`pattern`/`enum`/length and item bounds → rules

use serde::Deserialize;
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::naming;
use crate::registry::ResourceType;
use crate::schema::{Field, FieldType, Pattern, ResourceSchema, Rule};

/// Root properties never exposed as configuration
const DROPPED_ROOT_PROPERTIES: [&str; 3] = ["apiVersion", "kind", "status"];

/// Result of loading one or more CRD documents
#[derive(Debug, Clone, Default)]
pub struct CrdParse {
    pub resources: Vec<ResourceType>,
    /// Non-fatal notes: skipped versions, dropped constraints
    pub warnings: Vec<String>,
}

impl CrdParse {
    fn merge(&mut self, other: CrdParse) {
        self.resources.extend(other.resources);
        self.warnings.extend(other.warnings);
    }
}

/// Loader for CRD YAML manifests
pub struct CrdLoader;

impl CrdLoader {
    /// Parse one or more `---`-separated CRD documents
    pub fn parse(yaml: &str) -> Result<CrdParse> {
        let mut out = CrdParse::default();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            let value = Value::deserialize(doc)?;
            if value.is_null() {
                continue;
            }
            out.merge(Self::parse_value(&value)?);
        }
        Ok(out)
    }

    /// Whether a document is a CustomResourceDefinition
    pub fn is_crd(value: &Value) -> bool {
        value.get("kind").and_then(Value::as_str) == Some("CustomResourceDefinition")
    }

    /// Parse a single CRD document
    pub fn parse_value(value: &Value) -> Result<CrdParse> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("Missing 'kind' field"))?;

        if kind != "CustomResourceDefinition" {
            return Err(invalid(format!("Expected CustomResourceDefinition, got {}", kind)));
        }

        let crd_name = value
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("Missing 'metadata.name' field"))?;

        let spec = value
            .get("spec")
            .ok_or_else(|| invalid(format!("{}: missing 'spec' field", crd_name)))?;

        let group = spec
            .get("group")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(format!("{}: missing 'spec.group' field", crd_name)))?;

        let resource_kind = spec
            .get("names")
            .and_then(|n| n.get("kind"))
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(format!("{}: missing 'spec.names.kind' field", crd_name)))?;

        let namespaced = spec.get("scope").and_then(Value::as_str) != Some("Cluster");

        let versions = spec
            .get("versions")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid(format!("{}: missing 'spec.versions' array", crd_name)))?;

        let mut out = CrdParse::default();
        for version in versions {
            let name = version
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(format!("{}: version missing 'name' field", crd_name)))?;

            let served = version.get("served").and_then(Value::as_bool).unwrap_or(true);
            if !served {
                out.warnings
                    .push(format!("{}: skipping version {} (not served)", crd_name, name));
                continue;
            }

            let Some(root) = version.get("schema").and_then(|s| s.get("openAPIV3Schema")) else {
                out.warnings
                    .push(format!("{}: skipping version {} (no openAPIV3Schema)", crd_name, name));
                continue;
            };

            let mut converter = Converter {
                origin: format!("{}/{}", crd_name, name),
                warnings: Vec::new(),
            };
            let schema = converter.root(root, namespaced);
            out.warnings.append(&mut converter.warnings);

            out.resources.push(ResourceType {
                name: naming::resource_type_name(group, resource_kind, name),
                api_version: naming::api_version(group, name),
                kind: resource_kind.to_string(),
                description: root
                    .get("description")
                    .and_then(Value::as_str)
                    .map(String::from),
                schema,
            });
        }

        Ok(out)
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidCrd {
        message: message.into(),
    }
}

/// Standard object metadata exposed for every resource
fn metadata_field(namespaced: bool) -> Field {
    let mut fields = vec![Field::string("name").required().describe("Name of the resource")];
    if namespaced {
        fields.push(Field::string("namespace").describe("Namespace of the resource"));
    }
    fields.push(Field::map("labels").describe("Labels attached to the resource"));
    fields.push(Field::map("annotations").describe("Annotations attached to the resource"));

    Field::object("metadata", fields).required()
}

struct Converter {
    origin: String,
    warnings: Vec<String>,
}

impl Converter {
    fn warn(&mut self, path: &str, message: impl AsRef<str>) {
        self.warnings
            .push(format!("{}: {}: {}", self.origin, path, message.as_ref()));
    }

    fn root(&mut self, root: &Value, namespaced: bool) -> ResourceSchema {
        let required = required_list(root);
        let mut fields = vec![metadata_field(namespaced)];

        if let Some(properties) = root.get("properties").and_then(Value::as_object) {
            for (name, prop) in properties {
                if name == "metadata" || DROPPED_ROOT_PROPERTIES.contains(&name.as_str()) {
                    continue;
                }
                fields.push(self.property(name, prop, required.contains(name), name));
            }
        }

        ResourceSchema::new(fields)
    }

    fn property(&mut self, name: &str, prop: &Value, required: bool, path: &str) -> Field {
        let internal = match naming::snake_case(name) {
            s if s.is_empty() => name.to_string(),
            s => s,
        };

        let mut field = Field::new(internal, self.field_type(prop, path));
        if field.key() != name {
            field.external_name = Some(name.to_string());
        }
        field.required = required;
        field.description = prop.get("description").and_then(Value::as_str).map(String::from);
        field.rules = self.rules(prop, path);
        field
    }

    fn field_type(&mut self, prop: &Value, path: &str) -> FieldType {
        if flag(prop, "x-kubernetes-int-or-string") {
            return FieldType::String;
        }

        let properties = prop.get("properties").and_then(Value::as_object);
        match prop.get("type").and_then(Value::as_str) {
            Some("string") => FieldType::String,
            Some("integer") => FieldType::Integer,
            Some("number") => FieldType::Number,
            Some("boolean") => FieldType::Boolean,
            Some("array") => {
                let Some(items) = prop.get("items") else {
                    self.warn(path, "array without items, treated as list of strings");
                    return FieldType::List {
                        items: Box::new(FieldType::String),
                    };
                };
                match self.field_type(items, &format!("{}[]", path)) {
                    FieldType::Object { fields } => FieldType::ObjectList { fields },
                    other => FieldType::List {
                        items: Box::new(other),
                    },
                }
            }
            Some("object") | None if properties.is_some_and(|p| !p.is_empty()) => {
                let required = required_list(prop);
                let fields = properties
                    .into_iter()
                    .flatten()
                    .map(|(name, child)| {
                        let child_path = format!("{}.{}", path, name);
                        self.property(name, child, required.contains(name), &child_path)
                    })
                    .collect();
                FieldType::Object { fields }
            }
            Some("object") => {
                match prop.get("additionalProperties") {
                    Some(additional)
                        if additional.get("type").and_then(Value::as_str) == Some("string") => {}
                    Some(_) => self.warn(path, "non-string map values, treated as map of strings"),
                    None => self.warn(path, "free-form object, treated as map of strings"),
                }
                FieldType::Map
            }
            None if flag(prop, "x-kubernetes-preserve-unknown-fields") => {
                self.warn(path, "free-form value, treated as map of strings");
                FieldType::Map
            }
            None => {
                self.warn(path, "untyped property, treated as string");
                FieldType::String
            }
            Some(other) => {
                self.warn(path, format!("unsupported type '{}', treated as string", other));
                FieldType::String
            }
        }
    }

    fn rules(&mut self, prop: &Value, path: &str) -> Vec<Rule> {
        let mut rules = Vec::new();

        if let Some(min) = prop.get("minimum").and_then(Value::as_f64) {
            rules.push(Rule::AtLeast(min));
        }
        if let Some(max) = prop.get("maximum").and_then(Value::as_f64) {
            rules.push(Rule::AtMost(max));
        }
        if let Some(pattern) = prop.get("pattern").and_then(Value::as_str) {
            match Pattern::new(pattern) {
                Ok(p) => rules.push(Rule::Pattern(p)),
                Err(e) => self.warn(path, format!("dropping unsupported pattern: {}", e)),
            }
        }
        if let Some(values) = prop.get("enum").and_then(Value::as_array) {
            let allowed: Vec<String> = values
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect();
            if allowed.len() == values.len() && !allowed.is_empty() {
                rules.push(Rule::OneOf(allowed));
            } else {
                self.warn(path, "dropping non-string enum");
            }
        }
        if let Some(n) = usize_of(prop, "minLength") {
            rules.push(Rule::MinLength(n));
        }
        if let Some(n) = usize_of(prop, "maxLength") {
            rules.push(Rule::MaxLength(n));
        }
        if let Some(n) = usize_of(prop, "minItems").or_else(|| usize_of(prop, "minProperties")) {
            rules.push(Rule::MinItems(n));
        }
        if let Some(n) = usize_of(prop, "maxItems").or_else(|| usize_of(prop, "maxProperties")) {
            rules.push(Rule::MaxItems(n));
        }

        rules
    }
}

fn flag(prop: &Value, key: &str) -> bool {
    prop.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn usize_of(prop: &Value, key: &str) -> Option<usize> {
    prop.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

fn required_list(schema: &Value) -> Vec<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default()
}
