//! Describe command - show the schema of one resource type

use console::style;

use super::Context;
use crate::display::print_fields;
use crate::error::Result;

pub fn run(ctx: &Context, resource_type: &str, output_json: bool) -> Result<()> {
    let rt = ctx.resource_type(resource_type)?;

    if output_json {
        println!("{}", serde_json::to_string_pretty(&rt)?);
        return Ok(());
    }

    println!("{} {}", style("Resource type:").bold(), rt.name);
    println!("{} {}", style("API version:").bold(), rt.api_version);
    println!("{} {}", style("Kind:").bold(), rt.kind);
    if let Some(description) = &rt.description {
        println!("{} {}", style("Description:").bold(), description);
    }
    println!();
    println!("{}", style("Fields:").bold());
    print_fields(&rt.schema.fields, 0);

    Ok(())
}
