//! List command - list loaded resource types

use console::style;

use super::Context;
use crate::error::Result;

pub fn run(ctx: &Context, output_json: bool) -> Result<()> {
    let registry = ctx.registry()?;

    if output_json {
        let types: Vec<_> = registry
            .iter()
            .map(|rt| {
                serde_json::json!({
                    "name": rt.name,
                    "apiVersion": rt.api_version,
                    "kind": rt.kind,
                    "description": rt.description,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&types)?);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No resource types loaded");
        return Ok(());
    }

    let width = registry.names().map(str::len).max().unwrap_or(0).max(4);
    println!(
        "{:<width$}  {:<24} {}",
        style("NAME").bold(),
        style("KIND").bold(),
        style("API VERSION").bold(),
        width = width
    );
    for rt in registry.iter() {
        println!("{:<width$}  {:<24} {}", rt.name, rt.kind, rt.api_version, width = width);
    }

    Ok(())
}
