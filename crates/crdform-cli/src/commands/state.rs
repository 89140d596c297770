//! State command - inspect stored records

use console::style;

use super::Context;
use crate::error::Result;

pub async fn list(ctx: &Context, resource_type: Option<&str>, output_json: bool) -> Result<()> {
    let states = ctx.state_provider()?.list(resource_type).await?;

    if output_json {
        println!("{}", serde_json::to_string_pretty(&states)?);
        return Ok(());
    }

    if states.is_empty() {
        println!("No records in state");
        return Ok(());
    }

    println!(
        "{:<20} {:<24} {:<44} {}",
        style("ID").bold(),
        style("NAME").bold(),
        style("TYPE").bold(),
        style("CREATED").bold()
    );
    for state in &states {
        println!(
            "{:<20} {:<24} {:<44} {}",
            state.id,
            state.name().unwrap_or_else(|| "-".to_string()),
            state.resource_type,
            state.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}
