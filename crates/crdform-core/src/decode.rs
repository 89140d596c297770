//! Configuration decoding
//!
//! Builds a `ConfigurationTree` from JSON (or YAML read into JSON) using the
//! resource schema. `null` means absent. Keys the schema does not declare and
//! values of the wrong shape are reported as violations; decoding continues
//! past them so every problem surfaces at once.

use serde_json::{Map, Number, Value as JsonValue};
use indexmap::IndexMap;

use crate::schema::{Field, FieldType, IDENTITY_KEYS, ResourceSchema};
use crate::tree::{ConfigurationTree, Object, Value};
use crate::validate::{ValidationErrors, Violation, child_path, entry_path, index_path};

/// Decode configuration input into a tree
///
/// Root-level `apiVersion`/`kind` keys are dropped: those are always taken
/// from the resource type. Scalars given for string fields are stringified.
pub fn decode(
    schema: &ResourceSchema,
    input: &JsonValue,
) -> Result<ConfigurationTree, ValidationErrors> {
    let (tree, violations) = decode_lenient(schema, input);
    ValidationErrors::from_violations(violations).map(|()| tree)
}

pub(crate) fn decode_lenient(
    schema: &ResourceSchema,
    input: &JsonValue,
) -> (ConfigurationTree, Vec<Violation>) {
    let mut decoder = Decoder::default();
    let tree = match input {
        JsonValue::Null => Object::new(),
        JsonValue::Object(map) => decoder.object(&schema.fields, map, "", true),
        other => {
            decoder
                .violations
                .push(Violation::type_mismatch("(root)", "object", json_type_name(other)));
            Object::new()
        }
    };
    (tree, decoder.violations)
}

#[derive(Default)]
struct Decoder {
    violations: Vec<Violation>,
}

impl Decoder {
    fn object(
        &mut self,
        fields: &[Field],
        input: &Map<String, JsonValue>,
        path: &str,
        root: bool,
    ) -> Object {
        let mut out = Object::new();

        for field in fields {
            let Some(raw) = input.get(&field.name) else {
                continue;
            };
            if raw.is_null() {
                continue;
            }
            let field_path = child_path(path, &field.name);
            if let Some(value) = self.value(&field.field_type, raw, &field_path) {
                if !value.is_absent() {
                    out.insert(field.name.clone(), value);
                }
            }
        }

        for key in input.keys() {
            let declared = fields.iter().any(|f| &f.name == key);
            if !declared && !(root && IDENTITY_KEYS.contains(&key.as_str())) {
                self.violations.push(Violation::unknown_field(child_path(path, key)));
            }
        }

        out
    }

    fn value(&mut self, field_type: &FieldType, raw: &JsonValue, path: &str) -> Option<Value> {
        match (field_type, raw) {
            (FieldType::String, scalar) if scalar_string(scalar).is_some() => {
                scalar_string(scalar).map(Value::String)
            }
            (FieldType::Integer, JsonValue::Number(n)) => match integer(n) {
                Some(i) => Some(Value::Integer(i)),
                None => {
                    self.violations
                        .push(Violation::type_mismatch(path, "integer", "number"));
                    None
                }
            },
            (FieldType::Number, JsonValue::Number(n)) => n.as_f64().map(Value::Number),
            (FieldType::Boolean, JsonValue::Bool(b)) => Some(Value::Bool(*b)),
            (FieldType::List { items }, JsonValue::Array(values)) => {
                let mut out = Vec::with_capacity(values.len());
                for (i, item) in values.iter().enumerate() {
                    if let Some(v) = self.value(items, item, &index_path(path, i)) {
                        out.push(v);
                    }
                }
                Some(Value::List(out))
            }
            (FieldType::Map, JsonValue::Object(entries)) => {
                let mut out = IndexMap::with_capacity(entries.len());
                for (key, v) in entries {
                    match scalar_string(v) {
                        Some(s) => {
                            out.insert(key.clone(), s);
                        }
                        None if v.is_null() => {}
                        None => self.violations.push(Violation::type_mismatch(
                            entry_path(path, key),
                            "string",
                            json_type_name(v),
                        )),
                    }
                }
                Some(Value::Map(out))
            }
            (FieldType::Object { fields }, JsonValue::Object(map)) => {
                Some(Value::Object(self.object(fields, map, path, false)))
            }
            (FieldType::ObjectList { fields }, JsonValue::Array(values)) => {
                let mut out = Vec::with_capacity(values.len());
                for (i, item) in values.iter().enumerate() {
                    let item_path = index_path(path, i);
                    match item {
                        JsonValue::Object(map) => {
                            out.push(Value::Object(self.object(fields, map, &item_path, false)))
                        }
                        other => self.violations.push(Violation::type_mismatch(
                            item_path,
                            "object",
                            json_type_name(other),
                        )),
                    }
                }
                Some(Value::List(out))
            }
            (expected, other) => {
                self.violations.push(Violation::type_mismatch(
                    path,
                    expected.to_string(),
                    json_type_name(other),
                ));
                None
            }
        }
    }
}

/// Strings pass through; numbers and booleans are stringified
fn scalar_string(raw: &JsonValue) -> Option<String> {
    match raw {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integers, or floats with no fractional part within i64 range
fn integer(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            // i64::MAX as f64 rounds up to 2^63, which does not fit
            .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ResourceSchema {
        ResourceSchema::new(vec![
            Field::object(
                "metadata",
                vec![
                    Field::string("name"),
                    Field::string("namespace"),
                    Field::map("labels"),
                ],
            ),
            Field::object(
                "spec",
                vec![
                    Field::integer("replicas"),
                    Field::number("ratio"),
                    Field::boolean("paused"),
                    Field::list("ports", FieldType::Integer),
                    Field::object_list(
                        "iptables",
                        vec![Field::string("name"), Field::string("direction")],
                    ),
                    Field::object("selector", vec![Field::string("app")]),
                ],
            ),
        ])
    }

    #[test]
    fn test_decode_full_tree() {
        let input = json!({
            "metadata": {"name": "demo", "labels": {"app": "demo", "tier": "web"}},
            "spec": {
                "replicas": 3,
                "ratio": 1,
                "paused": false,
                "ports": [80, 443],
                "iptables": [{"name": "chain-a", "direction": "to"}]
            }
        });

        let tree = decode(&schema(), &input).unwrap();
        assert_eq!(tree.get_path("metadata.name"), Some(&Value::from("demo")));
        assert_eq!(tree.get_path("spec.replicas"), Some(&Value::Integer(3)));
        assert_eq!(tree.get_path("spec.ratio"), Some(&Value::Number(1.0)));
        assert_eq!(tree.get_path("spec.paused"), Some(&Value::Bool(false)));
        assert_eq!(
            tree.get_path("spec.ports"),
            Some(&Value::List(vec![Value::Integer(80), Value::Integer(443)]))
        );

        let Some(Value::Map(labels)) = tree.get_path("metadata.labels") else {
            panic!("expected labels map");
        };
        assert_eq!(labels.keys().collect::<Vec<_>>(), vec!["app", "tier"]);
    }

    #[test]
    fn test_null_and_empty_objects_are_absent() {
        let input = json!({
            "metadata": {"name": "demo", "namespace": null},
            "spec": {"selector": {}, "replicas": null}
        });

        let tree = decode(&schema(), &input).unwrap();
        assert!(tree.get_path("metadata.namespace").is_none());
        assert!(!tree.contains("spec"));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let input = json!({"metadata": {"name": "demo", "uid": "x"}, "status": {}});
        let errors = decode(&schema(), &input).unwrap_err();
        let paths: Vec<&str> = errors.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["metadata.uid", "status"]);
    }

    #[test]
    fn test_identity_keys_dropped_at_root_only() {
        let input = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "demo", "kind": "nested"}
        });
        let errors = decode(&schema(), &input).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.violations()[0].path, "metadata.kind");
    }

    #[test]
    fn test_integer_coercion() {
        let input = json!({"spec": {"replicas": 2.0}});
        let tree = decode(&schema(), &input).unwrap();
        assert_eq!(tree.get_path("spec.replicas"), Some(&Value::Integer(2)));

        let input = json!({"spec": {"replicas": 2.5}});
        let errors = decode(&schema(), &input).unwrap_err();
        assert_eq!(
            errors.violations()[0],
            Violation::type_mismatch("spec.replicas", "integer", "number")
        );
    }

    #[test]
    fn test_integer_out_of_range_is_a_mismatch() {
        let two_pow_63 = Number::from_f64(9_223_372_036_854_775_808.0).unwrap();
        assert_eq!(integer(&two_pow_63), None);

        let min = Number::from_f64(-9_223_372_036_854_775_808.0).unwrap();
        assert_eq!(integer(&min), Some(i64::MIN));

        let input = json!({"spec": {"replicas": 9_223_372_036_854_775_808.0}});
        let errors = decode(&schema(), &input).unwrap_err();
        assert_eq!(
            errors.violations()[0],
            Violation::type_mismatch("spec.replicas", "integer", "number")
        );
    }

    #[test]
    fn test_scalars_stringified_for_string_fields() {
        let input = json!({"metadata": {"name": 8080, "labels": {"port": 80, "on": true}}});
        let tree = decode(&schema(), &input).unwrap();
        assert_eq!(tree.get_path("metadata.name"), Some(&Value::from("8080")));

        let Some(Value::Map(labels)) = tree.get_path("metadata.labels") else {
            panic!("expected labels map");
        };
        assert_eq!(labels["port"], "80");
        assert_eq!(labels["on"], "true");
    }

    #[test]
    fn test_type_mismatches_collected() {
        let input = json!({
            "metadata": {"labels": {"nested": {"no": 1}}},
            "spec": {"paused": "yes", "ports": [80, "http"], "iptables": ["chain"]}
        });

        let errors = decode(&schema(), &input).unwrap_err();
        let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "metadata.labels[\"nested\"]: expected string, found object",
                "spec.paused: expected boolean, found string",
                "spec.ports[1]: expected integer, found string",
                "spec.iptables[0]: expected object, found string",
            ]
        );
    }

    #[test]
    fn test_root_must_be_object() {
        let errors = decode(&schema(), &json!([1, 2])).unwrap_err();
        assert_eq!(errors.violations()[0].path, "(root)");

        let tree = decode(&schema(), &JsonValue::Null).unwrap();
        assert!(tree.is_empty());
    }
}
