//! pbsconf Command-Line Interface
//!
//! Inspect and reconcile PBS Professional configuration through qmgr.
//!
//! ```text
//! pbsconf parse listing.txt
//! pbsconf plan --current listing.txt --desired cluster.yaml
//! pbsconf show queue workq
//! pbsconf apply cluster.yaml --dry-run
//! pbsconf delete node cn042
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{apply, delete, parse, plan, show};

/// pbsconf - declarative PBS Professional configuration over qmgr
#[derive(Parser)]
#[command(name = "pbsconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "PBSCONF_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Console, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Console,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a saved qmgr listing and print its records
    Parse {
        /// Listing file (output of `qmgr -c 'list <kind> @default'`)
        file: PathBuf,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Compute the commands turning a saved listing into a desired state
    Plan {
        /// Listing file with the current objects
        #[arg(long)]
        current: PathBuf,

        /// Desired state (YAML)
        #[arg(long)]
        desired: PathBuf,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show live objects of one kind
    Show {
        /// Object kind (queue, node, hook, resource, server)
        kind: String,

        /// Object name (all objects if omitted)
        name: Option<String>,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Reconcile PBS with a desired state
    Apply {
        /// Desired state (YAML)
        file: PathBuf,

        /// Print the commands without executing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete one object
    Delete {
        /// Object kind (queue, node, hook, resource)
        kind: String,

        /// Object name
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    match cli.log_format {
        LogFormat::Console => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::new(filter))
            .with_target(false)
            .init(),
    }

    let config = cli.config.as_deref();

    // Execute command
    let result = match cli.command {
        Commands::Parse { file, format } => parse::execute(&file, &format),

        Commands::Plan {
            current,
            desired,
            format,
        } => plan::execute(config, &current, &desired, &format),

        Commands::Show { kind, name, format } => {
            show::execute(config, &kind, name.as_deref(), &format).await
        }

        Commands::Apply { file, dry_run } => apply::execute(config, &file, dry_run).await,

        Commands::Delete { kind, name } => delete::execute(config, &kind, &name).await,
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
