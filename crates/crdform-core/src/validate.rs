//! Schema-driven validation
//!
//! One routine evaluates every field rule of a `ResourceSchema` against a
//! configuration tree. All violations are collected in a single pass; the
//! caller never sees only the first one.

use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error;

use crate::decode;
use crate::schema::{Field, FieldType, IDENTITY_KEYS, ResourceSchema, Rule};
use crate::tree::{ConfigurationTree, Object, Value};

/// A single rule violation at a field path
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Field path in configuration names (e.g. `spec.iptables[0].name`)
    pub path: String,
    pub kind: ViolationKind,
}

/// What went wrong at a path
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    /// A required field is absent
    Missing,
    /// A key the schema does not declare
    UnknownField,
    /// Value has the wrong shape
    TypeMismatch { expected: String, found: String },
    /// A field rule failed
    Rule { rule: Rule, detail: String },
}

impl Violation {
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ViolationKind::Missing,
        }
    }

    pub fn unknown_field(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ViolationKind::UnknownField,
        }
    }

    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            kind: ViolationKind::TypeMismatch {
                expected: expected.into(),
                found: found.into(),
            },
        }
    }

    pub fn rule(path: impl Into<String>, rule: Rule, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ViolationKind::Rule {
                rule,
                detail: detail.into(),
            },
        }
    }

    /// The failed rule, for rule violations
    pub fn failed_rule(&self) -> Option<&Rule> {
        match &self.kind {
            ViolationKind::Rule { rule, .. } => Some(rule),
            _ => None,
        }
    }

    /// Short rule name (`required`, `type`, `unknown-field` or the rule itself)
    pub fn rule_name(&self) -> String {
        match &self.kind {
            ViolationKind::Missing => "required".to_string(),
            ViolationKind::UnknownField => "unknown-field".to_string(),
            ViolationKind::TypeMismatch { .. } => "type".to_string(),
            ViolationKind::Rule { rule, .. } => rule.to_string(),
        }
    }

    /// Human readable message without the path
    pub fn message(&self) -> String {
        match &self.kind {
            ViolationKind::Missing => "required field is missing".to_string(),
            ViolationKind::UnknownField => "field is not declared by the schema".to_string(),
            ViolationKind::TypeMismatch { expected, found } => {
                format!("expected {}, found {}", expected, found)
            }
            ViolationKind::Rule { rule, detail } => format!("{} ({})", detail, rule),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message())
    }
}

/// Non-empty collection of violations from one tree
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} validation error(s): {}", .0.len(), summarize(.0))]
pub struct ValidationErrors(Vec<Violation>);

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// `Ok` when there is nothing to report
    pub fn from_violations(violations: Vec<Violation>) -> Result<(), Self> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self(violations))
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }
}

/// Validate a configuration tree against its schema
pub fn validate(schema: &ResourceSchema, tree: &ConfigurationTree) -> Result<(), ValidationErrors> {
    let mut walker = Walker::default();
    walker.object(&schema.fields, tree, "", true);
    ValidationErrors::from_violations(walker.violations)
}

/// Decode JSON configuration and validate it, reporting decode and rule
/// violations together
pub fn decode_validated(
    schema: &ResourceSchema,
    input: &JsonValue,
) -> Result<ConfigurationTree, ValidationErrors> {
    let (tree, mut violations) = decode::decode_lenient(schema, input);

    let mut walker = Walker::default();
    walker.object(&schema.fields, &tree, "", true);

    for violation in walker.violations {
        // A value dropped by the decoder would otherwise also show up as missing
        let reported = violations.iter().any(|v| v.path == violation.path);
        if matches!(violation.kind, ViolationKind::Missing) && reported {
            continue;
        }
        violations.push(violation);
    }

    ValidationErrors::from_violations(violations).map(|()| tree)
}

#[derive(Default)]
struct Walker {
    violations: Vec<Violation>,
}

impl Walker {
    fn object(&mut self, fields: &[Field], obj: &Object, path: &str, root: bool) {
        for (key, _) in obj.iter() {
            let declared = fields.iter().any(|f| f.name == key);
            if !declared && !(root && IDENTITY_KEYS.contains(&key)) {
                self.violations.push(Violation::unknown_field(child_path(path, key)));
            }
        }

        for field in fields {
            let field_path = child_path(path, &field.name);
            match obj.get(&field.name) {
                Some(value) if !value.is_absent() => {
                    self.value(&field.field_type, &field.rules, value, &field_path)
                }
                _ if field.required => self.violations.push(Violation::missing(field_path)),
                _ => {}
            }
        }
    }

    fn value(&mut self, field_type: &FieldType, rules: &[Rule], value: &Value, path: &str) {
        if !field_type.accepts(value) {
            self.violations.push(Violation::type_mismatch(
                path,
                field_type.to_string(),
                value.type_name(),
            ));
            return;
        }

        for rule in rules {
            if let Err(detail) = rule.check(value) {
                self.violations.push(Violation::rule(path, rule.clone(), detail));
            }
        }

        match (field_type, value) {
            (FieldType::List { items }, Value::List(values)) => {
                for (i, item) in values.iter().enumerate() {
                    self.value(items, &[], item, &index_path(path, i));
                }
            }
            (FieldType::Object { fields }, Value::Object(obj)) => {
                self.object(fields, obj, path, false);
            }
            (FieldType::ObjectList { fields }, Value::List(values)) => {
                for (i, item) in values.iter().enumerate() {
                    let item_path = index_path(path, i);
                    match item {
                        Value::Object(obj) => self.object(fields, obj, &item_path, false),
                        other => self.violations.push(Violation::type_mismatch(
                            item_path,
                            "object",
                            other.type_name(),
                        )),
                    }
                }
            }
            _ => {}
        }
    }
}

pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

pub(crate) fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

pub(crate) fn entry_path(parent: &str, key: &str) -> String {
    format!("{}[{:?}]", parent, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ResourceSchema {
        ResourceSchema::new(vec![
            Field::object(
                "metadata",
                vec![Field::string("name").required(), Field::string("namespace")],
            )
            .required(),
            Field::object(
                "spec",
                vec![
                    Field::integer("core_limit").rule(Rule::AtLeast(1.0)).rule(Rule::AtMost(64.0)),
                    Field::string("direction").rule(Rule::OneOf(vec!["to".into(), "from".into()])),
                    Field::object_list(
                        "iptables",
                        vec![
                            Field::string("name").required(),
                            Field::list("ipsets", FieldType::String).rule(Rule::MinItems(1)),
                        ],
                    ),
                ],
            ),
        ])
    }

    fn metadata() -> Object {
        Object::new().with("name", "demo")
    }

    #[test]
    fn test_at_least_violation_names_path_and_rule() {
        let tree = Object::new()
            .with("metadata", metadata())
            .with("spec", Object::new().with("core_limit", 0));

        let errors = validate(&schema(), &tree).unwrap_err();
        assert_eq!(errors.len(), 1);

        let violation = &errors.violations()[0];
        assert_eq!(violation.path, "spec.core_limit");
        assert_eq!(violation.failed_rule(), Some(&Rule::AtLeast(1.0)));
        assert_eq!(violation.rule_name(), "at-least(1)");
    }

    #[test]
    fn test_at_least_boundary_passes() {
        let tree = Object::new()
            .with("metadata", metadata())
            .with("spec", Object::new().with("core_limit", 1));

        assert!(validate(&schema(), &tree).is_ok());
    }

    #[test]
    fn test_all_violations_reported_in_one_pass() {
        let tree = Object::new().with(
            "spec",
            Object::new()
                .with("core_limit", 100)
                .with("direction", "sideways")
                .with(
                    "iptables",
                    vec![Value::Object(Object::new().with("ipsets", Vec::<Value>::new()))],
                ),
        );

        let errors = validate(&schema(), &tree).unwrap_err();
        let paths: Vec<&str> = errors.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "metadata",
                "spec.core_limit",
                "spec.direction",
                "spec.iptables[0].name",
                "spec.iptables[0].ipsets",
            ]
        );
    }

    #[test]
    fn test_required_children_only_checked_when_parent_present() {
        // spec is optional; its absence does not require iptables[].name
        let tree = Object::new().with("metadata", metadata());
        assert!(validate(&schema(), &tree).is_ok());
    }

    #[test]
    fn test_empty_required_object_is_missing() {
        let tree = Object::new().with("metadata", Object::new());
        let errors = validate(&schema(), &tree).unwrap_err();
        assert_eq!(errors.violations()[0], Violation::missing("metadata"));
    }

    #[test]
    fn test_type_mismatch_and_unknown_field() {
        let tree = Object::new()
            .with("metadata", metadata().with("uid", "abc"))
            .with("spec", Object::new().with("core_limit", "four"));

        let errors = validate(&schema(), &tree).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.violations()[0], Violation::unknown_field("metadata.uid"));
        assert_eq!(
            errors.violations()[1],
            Violation::type_mismatch("spec.core_limit", "integer", "string")
        );
    }

    #[test]
    fn test_identity_keys_are_ignored_at_root() {
        let tree = Object::new()
            .with("apiVersion", "example.com/v9")
            .with("kind", "Other")
            .with("metadata", metadata());
        assert!(validate(&schema(), &tree).is_ok());
    }

    #[test]
    fn test_decode_validated_merges_decode_and_rule_violations() {
        let input = json!({
            "metadata": {"name": 42, "extra": true},
            "spec": {"core_limit": "lots", "direction": "up"}
        });

        let errors = decode_validated(&schema(), &input).unwrap_err();
        let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "metadata.extra: field is not declared by the schema",
                "spec.core_limit: expected integer, found string",
                "spec.direction: 'up' is not one of [to, from] (one-of(to|from))",
            ]
        );
    }

    #[test]
    fn test_decode_validated_success() {
        let input = json!({"metadata": {"name": "demo"}, "spec": {"core_limit": 3}});
        let tree = decode_validated(&schema(), &input).unwrap();
        assert_eq!(tree.get_path("spec.core_limit"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_error_display() {
        let errors = ValidationErrors::from_violations(vec![Violation::missing("metadata.name")])
            .unwrap_err();
        assert_eq!(
            errors.to_string(),
            "1 validation error(s): metadata.name: required field is missing"
        );
    }
}
