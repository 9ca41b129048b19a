mod commands;
mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "core-monitor")]
#[command(about = "Collect, persist and summarize metrics reported on the message bus", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve an in-process bus fed with newline-delimited JSON messages
    Run {
        /// Settings file (YAML, TOML, or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Message file; reads stdin when omitted
        #[arg(short, long)]
        events: Option<PathBuf>,
    },

    /// Print stored entries from a persisted state file
    Query {
        /// Metric name; all metrics when omitted
        name: Option<String>,

        /// State file (defaults to the configured location)
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Settings file used to locate the state file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print min/max/avg per numeric field of a metric
    Aggregate {
        /// Metric name
        name: String,

        /// State file (defaults to the configured location)
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Settings file used to locate the state file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Validate a settings file and show the resolved configuration
    Validate {
        /// Path to settings file
        config_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { config, events } => {
            commands::run::execute(config, events).await?;
        }

        Commands::Query {
            name,
            state,
            config,
        } => {
            commands::query::execute(name, state, config).await?;
        }

        Commands::Aggregate {
            name,
            state,
            config,
            format,
        } => {
            commands::aggregate::execute(name, state, config, format).await?;
        }

        Commands::Validate { config_file } => {
            commands::validate::execute(config_file).await?;
        }
    }

    Ok(())
}
