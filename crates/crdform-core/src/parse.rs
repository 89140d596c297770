//! Manifest parsing
//!
//! Reads a projected manifest back into a configuration tree using the same
//! schema, mapping external keys to internal field names.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value as YamlValue};

use crate::error::{CoreError, Result};
use crate::schema::{Field, FieldType, IDENTITY_KEYS, ResourceSchema};
use crate::tree::{ConfigurationTree, Object, Value};
use crate::validate::{child_path, index_path};

/// A manifest split into identity and configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedManifest {
    pub api_version: String,
    pub kind: String,
    pub tree: ConfigurationTree,
}

/// Parse manifest text against a schema
pub fn parse_manifest(text: &str, schema: &ResourceSchema) -> Result<ParsedManifest> {
    let doc: YamlValue = serde_yaml::from_str(text)?;
    let YamlValue::Mapping(root) = doc else {
        return Err(invalid("manifest root must be a mapping"));
    };

    let api_version = identity(&root, "apiVersion")?;
    let kind = identity(&root, "kind")?;
    let tree = object(&schema.fields, &root, "")?;

    Ok(ParsedManifest {
        api_version,
        kind,
        tree,
    })
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidManifest {
        message: message.into(),
    }
}

fn identity(root: &Mapping, key: &str) -> Result<String> {
    match root.get(key) {
        Some(YamlValue::String(s)) => Ok(s.clone()),
        Some(_) => Err(invalid(format!("'{}' must be a string", key))),
        None => Err(invalid(format!("missing '{}'", key))),
    }
}

fn object(fields: &[Field], mapping: &Mapping, path: &str) -> Result<Object> {
    let mut out = Object::new();

    for (key, raw) in mapping {
        let key = key
            .as_str()
            .ok_or_else(|| invalid(format!("non-string key under '{}'", display(path))))?;
        if path.is_empty() && IDENTITY_KEYS.contains(&key) {
            continue;
        }
        let field = fields
            .iter()
            .find(|f| f.key() == key)
            .ok_or_else(|| invalid(format!("unknown key '{}'", child_path(path, key))))?;

        if raw.is_null() {
            continue;
        }
        let value = value(&field.field_type, raw, &child_path(path, &field.name))?;
        if !value.is_absent() {
            out.insert(field.name.clone(), value);
        }
    }

    Ok(out)
}

fn value(field_type: &FieldType, raw: &YamlValue, path: &str) -> Result<Value> {
    let mismatch = || invalid(format!("{}: expected {}", path, field_type));

    match (field_type, raw) {
        (FieldType::String, YamlValue::String(s)) => Ok(Value::String(s.clone())),
        (FieldType::Integer, YamlValue::Number(n)) => {
            n.as_i64().map(Value::Integer).ok_or_else(mismatch)
        }
        (FieldType::Number, YamlValue::Number(n)) => Ok(match n.as_i64() {
            Some(i) if !n.is_f64() => Value::Integer(i),
            _ => Value::Number(n.as_f64().ok_or_else(mismatch)?),
        }),
        (FieldType::Boolean, YamlValue::Bool(b)) => Ok(Value::Bool(*b)),
        (FieldType::List { items }, YamlValue::Sequence(values)) => values
            .iter()
            .enumerate()
            .map(|(i, item)| value(items, item, &index_path(path, i)))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        (FieldType::ObjectList { fields }, YamlValue::Sequence(values)) => values
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                YamlValue::Mapping(m) => object(fields, m, &index_path(path, i)).map(Value::Object),
                _ => Err(invalid(format!("{}: expected object", index_path(path, i)))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        (FieldType::Map, YamlValue::Mapping(entries)) => {
            let mut out = IndexMap::with_capacity(entries.len());
            for (k, v) in entries {
                match (k.as_str(), v.as_str()) {
                    (Some(k), Some(v)) => {
                        out.insert(k.to_string(), v.to_string());
                    }
                    _ => return Err(invalid(format!("{}: expected map of strings", path))),
                }
            }
            Ok(Value::Map(out))
        }
        (FieldType::Object { fields }, YamlValue::Mapping(m)) => object(fields, m, path).map(Value::Object),
        _ => Err(mismatch()),
    }
}

fn display(path: &str) -> &str {
    if path.is_empty() { "(root)" } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Projector;

    fn schema() -> ResourceSchema {
        ResourceSchema::new(vec![
            Field::object("metadata", vec![Field::string("name"), Field::map("labels")]),
            Field::object(
                "spec",
                vec![
                    Field::integer("core_limit"),
                    Field::number("ratio"),
                    Field::list("ports", FieldType::Integer),
                    Field::object_list("rules", vec![Field::string("host"), Field::boolean("tls")]),
                ],
            ),
        ])
    }

    #[test]
    fn test_parse_maps_external_names() {
        let text = r#"
apiVersion: example.com/v1
kind: Widget
metadata:
  name: demo
spec:
  coreLimit: 3
  ratio: 0.25
  ports: [80, 443]
  rules:
    - host: a.example.com
      tls: true
    - {}
"#;
        let parsed = parse_manifest(text, &schema()).unwrap();
        assert_eq!(parsed.api_version, "example.com/v1");
        assert_eq!(parsed.kind, "Widget");
        assert_eq!(parsed.tree.get_path("spec.core_limit"), Some(&Value::Integer(3)));
        assert_eq!(parsed.tree.get_path("spec.ratio"), Some(&Value::Number(0.25)));

        let rules = parsed.tree.get_path("spec.rules").and_then(Value::as_list).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1], Value::Object(Object::new()));
    }

    #[test]
    fn test_round_trip_through_projector() {
        let mut labels = IndexMap::new();
        labels.insert("app".to_string(), "demo".to_string());
        labels.insert("version".to_string(), "1.0".to_string());

        let tree = Object::new()
            .with("metadata", Object::new().with("name", "demo").with("labels", labels))
            .with(
                "spec",
                Object::new()
                    .with("core_limit", 8)
                    .with("ratio", 2.0)
                    .with("ports", vec![Value::Integer(80)])
                    .with(
                        "rules",
                        vec![Value::Object(Object::new().with("host", "true").with("tls", false))],
                    ),
            );

        let record = Projector::default()
            .project(&schema(), &tree, "example.com/v1", "Widget")
            .unwrap();
        let parsed = parse_manifest(&record.manifest, &schema()).unwrap();

        assert_eq!(parsed.tree, tree);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let text = "apiVersion: v1\nkind: Widget\nstatus:\n  ready: true\n";
        let err = parse_manifest(text, &schema()).unwrap_err();
        assert!(err.to_string().contains("unknown key 'status'"));
    }

    #[test]
    fn test_missing_identity_rejected() {
        let err = parse_manifest("kind: Widget\n", &schema()).unwrap_err();
        assert!(err.to_string().contains("missing 'apiVersion'"));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let text = "apiVersion: v1\nkind: Widget\nspec:\n  coreLimit: many\n";
        let err = parse_manifest(text, &schema()).unwrap_err();
        assert!(err.to_string().contains("spec.core_limit: expected integer"));
    }
}
