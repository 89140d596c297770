//! Render command - print the manifest a configuration projects to

use std::path::Path;

use super::{Context, read_config};
use crate::error::Result;

pub fn run(
    ctx: &Context,
    resource_type: &str,
    config_path: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let provider = ctx.dry_run_provider()?;
    let config = read_config(config_path)?;
    let record = provider.handler(resource_type)?.plan(&config)?;

    match output {
        Some(path) => {
            std::fs::write(path, &record.manifest)?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", record.manifest),
    }

    Ok(())
}
