//! Show command - print a stored record

use console::style;
use crdform_core::parse_manifest;

use super::Context;
use crate::error::Result;

pub async fn run(ctx: &Context, id: u64, tree: bool, output_json: bool) -> Result<()> {
    let provider = ctx.state_provider()?;
    let state = provider.read(id).await?;

    if tree {
        let rt = provider.registry().require(&state.resource_type)?;
        let parsed = parse_manifest(&state.manifest, &rt.schema)?;
        println!("{}", serde_json::to_string_pretty(&parsed.tree.to_json())?);
        return Ok(());
    }

    if output_json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!("{} {}", style("ID:").bold(), state.id);
    println!("{} {}", style("Resource type:").bold(), state.resource_type);
    println!(
        "{} {}",
        style("Created:").bold(),
        state.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
    print!("{}", state.manifest);

    Ok(())
}
