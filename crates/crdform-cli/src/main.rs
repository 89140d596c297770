//! crdform CLI - validate and project Kubernetes custom resources

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

mod commands;
mod display;
mod error;
mod exit_codes;

use commands::Context;
use error::Result;

#[derive(Parser)]
#[command(name = "crdform")]
#[command(author = "crdform Contributors")]
#[command(version)]
#[command(about = "Validate and project Kubernetes custom resources from CRD schemas", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./crdform.yaml, then the user config directory)
    #[arg(short, long, global = true, env = "CRDFORM_CONFIG")]
    config: Option<PathBuf>,

    /// CRD file, schema table or directory to load (repeatable)
    #[arg(short, long = "schema", global = true)]
    schemas: Vec<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List loaded resource types
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the field tree of a resource type
    Describe {
        /// Resource type name
        resource_type: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a resource configuration
    Validate {
        /// Resource type name
        resource_type: String,

        /// Configuration file (YAML or JSON, `-` for stdin)
        config: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the manifest without recording state
    Render {
        /// Resource type name
        resource_type: String,

        /// Configuration file (YAML or JSON, `-` for stdin)
        config: PathBuf,

        /// Write the manifest to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Project a configuration and record it in state
    Apply {
        /// Resource type name
        resource_type: String,

        /// Configuration file (YAML or JSON, `-` for stdin)
        config: PathBuf,

        /// Replace an existing record (the new record gets a fresh id)
        #[arg(long, value_name = "ID")]
        replace: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a stored record
    Show {
        /// Record id
        id: u64,

        /// Print the manifest parsed back into a configuration tree
        #[arg(long, conflicts_with = "json")]
        tree: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a record from local state
    Destroy {
        /// Record id
        id: u64,
    },

    /// Inspect local state
    #[command(subcommand)]
    State(StateCommands),
}

#[derive(Subcommand)]
enum StateCommands {
    /// List stored records
    List {
        /// Only records of this resource type
        #[arg(short = 't', long = "type")]
        resource_type: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(debug: bool) {
    let env = if debug {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string())
    };
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(cli.config.as_deref(), cli.schemas)?;

    match cli.command {
        Commands::List { json } => commands::list::run(&ctx, json),

        Commands::Describe {
            resource_type,
            json,
        } => commands::describe::run(&ctx, &resource_type, json),

        Commands::Validate {
            resource_type,
            config,
            json,
        } => commands::validate::run(&ctx, &resource_type, &config, json),

        Commands::Render {
            resource_type,
            config,
            output,
        } => commands::render::run(&ctx, &resource_type, &config, output.as_deref()),

        Commands::Apply {
            resource_type,
            config,
            replace,
            json,
        } => commands::apply::run(&ctx, &resource_type, &config, replace, json).await,

        Commands::Show { id, tree, json } => commands::show::run(&ctx, id, tree, json).await,

        Commands::Destroy { id } => commands::destroy::run(&ctx, id).await,

        Commands::State(StateCommands::List {
            resource_type,
            json,
        }) => commands::state::list(&ctx, resource_type.as_deref(), json).await,
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(e) = run(cli).await {
        let code = e.exit_code();
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(code);
    }

    Ok(())
}
