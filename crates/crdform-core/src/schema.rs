//! Resource schema model
//!
//! A `ResourceSchema` is the declarative shape of one resource type's
//! configuration. Schemas are plain data: they can be built in code, loaded
//! from a schema table file or derived from a CRD's OpenAPI schema.
//!
//! Schema table files use this layout:
//!
//! ```yaml
//! fields:
//!   - name: metadata
//!     type: object
//!     required: true
//!     fields:
//!       - name: name
//!         type: string
//!         required: true
//!   - name: spec
//!     type: object
//!     fields:
//!       - name: core_limit
//!         type: integer
//!         rules:
//!           - at-least: 1
//! ```

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use crate::error::{CoreError, Result};
use crate::naming;
use crate::tree::Value;

/// Root keys owned by the projector, never taken from configuration
pub const IDENTITY_KEYS: [&str; 2] = ["apiVersion", "kind"];

/// Declarative description of a resource type's configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSchema {
    /// Root fields in declaration order
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl ResourceSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Look up a root field by internal name
    pub fn field(&self, name: &str) -> Option<&Field> {
        find_field(&self.fields, name)
    }

    /// Look up a nested field by dot-separated internal path
    pub fn get_nested(&self, path: &str) -> Option<&Field> {
        let mut fields = self.fields.as_slice();
        let mut found = None;
        for part in path.split('.') {
            let field = find_field(fields, part)?;
            fields = field.field_type.child_fields().unwrap_or(&[]);
            found = Some(field);
        }
        found
    }

    /// Check structural invariants: names unique per level on both the
    /// configuration and the manifest side, and no field shadows an identity key
    pub fn verify(&self) -> Result<()> {
        for field in &self.fields {
            let key = field.key();
            if IDENTITY_KEYS.contains(&key.as_ref()) {
                return Err(CoreError::InvalidSchema {
                    message: format!("root field '{}' collides with reserved key '{}'", field.name, key),
                });
            }
        }
        verify_fields(&self.fields, "")
    }
}

fn find_field<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields.iter().find(|f| f.name == name)
}

fn verify_fields(fields: &[Field], path: &str) -> Result<()> {
    let mut names = HashSet::new();
    let mut keys = HashSet::new();

    for field in fields {
        let field_path = join_path(path, &field.name);
        if field.name.is_empty() {
            return Err(CoreError::InvalidSchema {
                message: format!("empty field name under '{}'", display_path(path)),
            });
        }
        if !names.insert(field.name.as_str()) {
            return Err(CoreError::InvalidSchema {
                message: format!("duplicate field '{}'", field_path),
            });
        }
        if !keys.insert(field.key().into_owned()) {
            return Err(CoreError::InvalidSchema {
                message: format!("duplicate manifest key '{}' at '{}'", field.key(), field_path),
            });
        }
        verify_type(&field.field_type, &field_path)?;
    }
    Ok(())
}

fn verify_type(field_type: &FieldType, path: &str) -> Result<()> {
    match field_type {
        FieldType::List { items } => verify_type(items, path),
        FieldType::Object { fields } | FieldType::ObjectList { fields } => verify_fields(fields, path),
        _ => Ok(()),
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "(root)" } else { path }
}

/// A single field of a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Configuration key (e.g. `core_limit`)
    pub name: String,

    /// Manifest key; derived as lowerCamelCase of `name` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_name: Option<String>,

    #[serde(flatten)]
    pub field_type: FieldType,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            external_name: None,
            field_type,
            required: false,
            rules: Vec::new(),
            description: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn list(name: impl Into<String>, items: FieldType) -> Self {
        Self::new(name, FieldType::List { items: Box::new(items) })
    }

    pub fn map(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Map)
    }

    pub fn object(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(name, FieldType::Object { fields })
    }

    pub fn object_list(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(name, FieldType::ObjectList { fields })
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Override the manifest key
    pub fn external(mut self, name: impl Into<String>) -> Self {
        self.external_name = Some(name.into());
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The key this field is written under in a manifest
    pub fn key(&self) -> Cow<'_, str> {
        match &self.external_name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(naming::lower_camel(&self.name)),
        }
    }
}

/// Semantic type of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    /// List of scalars, maps or nested lists
    List { items: Box<FieldType> },
    /// Map of string to string
    Map,
    /// Nested object
    Object {
        #[serde(default)]
        fields: Vec<Field>,
    },
    /// List of nested objects
    ObjectList {
        #[serde(default)]
        fields: Vec<Field>,
    },
}

impl FieldType {
    /// Child fields of object-shaped types
    pub fn child_fields(&self) -> Option<&[Field]> {
        match self {
            Self::Object { fields } | Self::ObjectList { fields } => Some(fields),
            _ => None,
        }
    }

    /// Whether a value has the shape this type expects (one level deep)
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::String, Value::String(_))
                | (Self::Integer, Value::Integer(_))
                | (Self::Number, Value::Integer(_) | Value::Number(_))
                | (Self::Boolean, Value::Bool(_))
                | (Self::List { .. } | Self::ObjectList { .. }, Value::List(_))
                | (Self::Map, Value::Map(_))
                | (Self::Object { .. }, Value::Object(_))
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::List { items } => write!(f, "list({})", items),
            Self::Map => write!(f, "map(string)"),
            Self::Object { .. } => write!(f, "object"),
            Self::ObjectList { .. } => write!(f, "list(object)"),
        }
    }
}

/// Validation rule attached to a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    /// Numeric value must be >= n
    AtLeast(f64),
    /// Numeric value must be <= n
    AtMost(f64),
    /// String must match the regex
    Pattern(Pattern),
    /// String must be one of the listed values
    OneOf(Vec<String>),
    MinLength(usize),
    MaxLength(usize),
    /// Minimum number of list items or map entries
    MinItems(usize),
    /// Maximum number of list items or map entries
    MaxItems(usize),
}

impl Rule {
    /// Evaluate the rule; values of a type the rule does not apply to pass
    pub fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match (self, value) {
            (Self::AtLeast(min), v) => match v.as_f64() {
                Some(n) if n < *min => Err(format!("{} is less than {}", n, min)),
                _ => Ok(()),
            },
            (Self::AtMost(max), v) => match v.as_f64() {
                Some(n) if n > *max => Err(format!("{} is greater than {}", n, max)),
                _ => Ok(()),
            },
            (Self::Pattern(pattern), Value::String(s)) if !pattern.is_match(s) => {
                Err(format!("'{}' does not match '{}'", s, pattern.as_str()))
            }
            (Self::OneOf(allowed), Value::String(s)) if !allowed.contains(s) => {
                Err(format!("'{}' is not one of [{}]", s, allowed.join(", ")))
            }
            (Self::MinLength(min), Value::String(s)) if s.chars().count() < *min => {
                Err(format!("length {} is shorter than {}", s.chars().count(), min))
            }
            (Self::MaxLength(max), Value::String(s)) if s.chars().count() > *max => {
                Err(format!("length {} is longer than {}", s.chars().count(), max))
            }
            (Self::MinItems(min), v) => match v.item_count() {
                Some(n) if n < *min => Err(format!("{} item(s), at least {} required", n, min)),
                _ => Ok(()),
            },
            (Self::MaxItems(max), v) => match v.item_count() {
                Some(n) if n > *max => Err(format!("{} item(s), at most {} allowed", n, max)),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtLeast(n) => write!(f, "at-least({})", n),
            Self::AtMost(n) => write!(f, "at-most({})", n),
            Self::Pattern(p) => write!(f, "pattern({})", p.as_str()),
            Self::OneOf(values) => write!(f, "one-of({})", values.join("|")),
            Self::MinLength(n) => write!(f, "min-length({})", n),
            Self::MaxLength(n) => write!(f, "max-length({})", n),
            Self::MinItems(n) => write!(f, "min-items({})", n),
            Self::MaxItems(n) => write!(f, "max-items({})", n),
        }
    }
}

/// Compiled regex that serializes as its source string
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.0.is_match(s)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}
