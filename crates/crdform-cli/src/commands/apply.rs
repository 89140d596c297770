//! Apply command - project a configuration and record it in state

use console::style;
use std::path::Path;

use super::{Context, read_config};
use crate::error::Result;

pub async fn run(
    ctx: &Context,
    resource_type: &str,
    config_path: &Path,
    replace: Option<u64>,
    output_json: bool,
) -> Result<()> {
    let provider = ctx.provider()?;
    let config = read_config(config_path)?;

    let state = match replace {
        Some(prior) => provider.update(resource_type, prior, &config).await?,
        None => provider.create(resource_type, &config).await?,
    };

    if output_json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    let action = if replace.is_some() { "Replaced" } else { "Created" };
    println!(
        "{} {} {} {}",
        style("✓").green().bold(),
        action,
        state.kind,
        style(state.name().unwrap_or_else(|| "(unnamed)".to_string())).bold()
    );
    println!("  id: {}", state.id);
    if let Some(prior) = replace {
        println!("  replaces: {}", prior);
    }

    Ok(())
}
