mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use omiverse::config::OmiverseConfig;
use omiverse::server;

#[derive(Parser)]
#[command(name = "omiverse", version, about = "Personal knowledge graph built from conversation transcripts")]
struct Cli {
    /// Path to a config file (defaults to ~/.omiverse/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Ingest a transcript JSON file for a user
    Ingest {
        file: PathBuf,
        #[arg(long)]
        uid: String,
    },
    /// Ask a question against a user's transcripts and graph
    Search {
        query: String,
        #[arg(long)]
        uid: String,
    },
    /// Print a user's knowledge graph as JSON
    Graph {
        #[arg(long)]
        uid: String,
    },
    /// Check database health and configuration
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => OmiverseConfig::load_from(path)?,
        None => OmiverseConfig::load()?,
    };

    // stdout is reserved for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve(config).await?,
        Command::Ingest { file, uid } => cli::ingest::ingest(&config, &file, &uid).await?,
        Command::Search { query, uid } => cli::search::search(&config, &uid, &query).await?,
        Command::Graph { uid } => cli::graph::graph(&config, &uid)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
