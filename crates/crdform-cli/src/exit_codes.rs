//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - configuration violates the resource schema
pub const VALIDATION_ERROR: i32 = 2;

/// Serialization error - manifest could not be produced
pub const SERIALIZATION_ERROR: i32 = 3;

/// Schema error - CRD or schema table failed to load
pub const SCHEMA_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or configuration (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
