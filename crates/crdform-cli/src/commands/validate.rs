//! Validate command - check resource configuration against its schema

use console::style;
use std::path::Path;

use super::{Context, read_config};
use crate::display::ValidationReport;
use crate::error::Result;
use crate::exit_codes;

pub fn run(ctx: &Context, resource_type: &str, config_path: &Path, output_json: bool) -> Result<()> {
    let provider = ctx.dry_run_provider()?;
    let handler = provider.handler(resource_type)?;
    let config = read_config(config_path)?;

    if !output_json {
        println!(
            "{} Validating {} against {}",
            style("→").blue(),
            config_path.display(),
            resource_type
        );
    }

    let source = config_path.display().to_string();
    let report = match handler.validate_config(&config) {
        Ok(_) => ValidationReport::new(source, None),
        Err(e) => match e.core().and_then(|c| c.violations()) {
            Some(violations) => ValidationReport::new(source, Some(violations)),
            None => return Err(e.into()),
        },
    };

    if output_json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        if report.has_errors() {
            report.display();
            println!();
        }
        report.print_summary();
    }

    if report.has_errors() {
        std::process::exit(exit_codes::VALIDATION_ERROR);
    }
    Ok(())
}
