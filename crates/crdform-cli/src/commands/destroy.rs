//! Destroy command - remove a record from local state

use console::style;
use crdform_provider::ProviderError;

use super::Context;
use crate::error::Result;

pub async fn run(ctx: &Context, id: u64) -> Result<()> {
    let provider = ctx.state_provider()?;

    let removed = match provider.delete(id).await {
        Ok(removed) => removed,
        Err(e @ ProviderError::CorruptState { .. }) => {
            eprintln!("{} {}", style("warning:").yellow().bold(), e);
            provider.purge(id).await?;
            println!(
                "{} Removed unreadable record {} from state",
                style("✓").green().bold(),
                id
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "{} Removed {} {} (id {}) from state",
        style("✓").green().bold(),
        removed.kind,
        removed.name().unwrap_or_else(|| "(unnamed)".to_string()),
        removed.id
    );

    Ok(())
}
