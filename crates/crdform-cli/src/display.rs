//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Validation violations grouped by top-level field
//! - Schema trees for `describe`

use console::style;
use crdform_core::{Field, FieldType, ValidationErrors, Violation};
use std::collections::BTreeMap;

/// Grouped validation results for display
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub source: String,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new(source: impl Into<String>, errors: Option<&ValidationErrors>) -> Self {
        Self {
            source: source.into(),
            violations: errors.map(|e| e.violations().to_vec()).unwrap_or_default(),
        }
    }

    /// Display violations grouped by their top-level field
    pub fn display(&self) {
        let mut by_root: BTreeMap<&str, Vec<&Violation>> = BTreeMap::new();
        for violation in &self.violations {
            by_root.entry(root_of(&violation.path)).or_default().push(violation);
        }

        println!();
        println!("{}", style(&self.source).cyan().bold());

        for (root, violations) in by_root {
            println!("  {} {}", style("→").blue(), style(root).yellow());
            for violation in violations {
                println!(
                    "    {} {} at {}",
                    style("✗").red(),
                    violation.message(),
                    style(&violation.path).dim()
                );
            }
        }
    }

    /// Print summary line
    pub fn print_summary(&self) {
        if self.violations.is_empty() {
            println!("{} Validation passed!", style("✓").green().bold());
        } else {
            println!(
                "{} Validation failed: {} error(s)",
                style("✗").red().bold(),
                self.violations.len()
            );
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "valid": !self.has_errors(),
            "source": self.source,
            "errors": self.violations.iter().map(|v| {
                serde_json::json!({
                    "path": v.path,
                    "rule": v.rule_name(),
                    "message": v.message(),
                })
            }).collect::<Vec<_>>(),
        })
    }
}

/// First path segment: `spec.iptables[0].name` → `spec`
fn root_of(path: &str) -> &str {
    let end = path.find(['.', '[']).unwrap_or(path.len());
    &path[..end]
}

/// Print a field tree with types, flags and rules
pub fn print_fields(fields: &[Field], depth: usize) {
    let indent = "  ".repeat(depth + 1);
    for field in fields {
        let mut line = format!(
            "{}{} {}",
            indent,
            style(&field.name).bold(),
            style(field.field_type.to_string()).dim()
        );
        if let Some(external) = &field.external_name {
            line.push_str(&format!(" {}", style(format!("as {}", external)).dim()));
        }
        if field.required {
            line.push_str(&format!(" {}", style("required").red()));
        }
        for rule in &field.rules {
            line.push_str(&format!(" {}", style(rule.to_string()).magenta()));
        }
        println!("{}", line);

        if let FieldType::Object { fields } | FieldType::ObjectList { fields } = &field.field_type {
            print_fields(fields, depth + 1);
        }
    }
}
