//! graphkb CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod sqlite;

#[derive(Parser)]
#[command(name = "graphkb")]
#[command(about = "Knowledge graph of assets and relations published by data sources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (defaults to ./graphkb.yml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Count assets and relations across all sources
    Count,
    /// Remove every source from the store
    Flush,
    /// Print the graph of a source
    Read {
        source: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Publish a YAML data-source file as the new graph of a source
    Publish { source: String, file: PathBuf },
    /// Print the updates turning one data-source file into another
    Diff { old: PathBuf, new: PathBuf },
    /// Translate a JSON query into SQL
    Translate { query: PathBuf },
    /// Run a JSON query over the stored graphs
    Query { query: PathBuf },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load(cli.config.as_deref())?;

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("graphkb={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Data directory: {}", config.data_dir.display());

    match cli.command {
        Commands::Count => commands::count(&config).await,
        Commands::Flush => commands::flush(&config).await,
        Commands::Read { source, json } => commands::read(&config, &source, json).await,
        Commands::Publish { source, file } => commands::publish(&config, &source, &file).await,
        Commands::Diff { old, new } => commands::diff(&old, &new),
        Commands::Translate { query } => commands::translate(&query),
        Commands::Query { query } => commands::query(&config, &query).await,
        Commands::Version => {
            println!("graphkb v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
