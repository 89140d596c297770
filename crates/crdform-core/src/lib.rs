//! crdform Core - schema-driven manifest projection
//!
//! This crate provides the generic engine behind every crdform resource type:
//! - `ResourceSchema`: Declarative field tree for a resource type
//! - `ConfigurationTree`: Optional-valued configuration mirroring a schema
//! - `validate`: Rule evaluation reporting every violation in one pass
//! - `Projector`: Configuration tree to YAML manifest plus fresh identifier
//! - `ResourceRegistry`: Resource type table loaded from CRDs or schema tables

pub mod crd;
pub mod decode;
pub mod error;
pub mod id;
pub mod naming;
pub mod parse;
pub mod project;
pub mod registry;
pub mod schema;
pub mod tree;
pub mod validate;

pub use crd::{CrdLoader, CrdParse};
pub use decode::decode;
pub use error::{CoreError, Result};
pub use id::{IdGenerator, IdPolicy, Monotonic, RandomId, WallClock};
pub use parse::{ParsedManifest, parse_manifest};
pub use project::{ManifestRecord, ProjectOptions, Projector, project};
pub use registry::{LoadOutcome, ResourceRegistry, ResourceType, SchemaTable};
pub use schema::{Field, FieldType, Pattern, ResourceSchema, Rule};
pub use tree::{ConfigurationTree, Object, Value};
pub use validate::{ValidationErrors, Violation, ViolationKind, decode_validated, validate};
