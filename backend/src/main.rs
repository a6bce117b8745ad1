//! Main entry point for the funapps backend.
//!
//! Parses the command line, loads configuration, initializes logging and
//! dispatches to the server or the database maintenance commands.

use std::{path::PathBuf, sync::Arc};

use adapters::ContentStore;
use anyhow::Result;
use backend::{config::Config, database, serve, AppState};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// funapps - content listing site backend
#[derive(Parser)]
#[command(name = "funapps")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for the HTTP server
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve from an in-memory store instead of the database
    #[arg(long)]
    mock: bool,

    /// Fixtures to preload into the in-memory store
    #[arg(long, requires = "mock")]
    fixtures: Option<PathBuf>,

    /// Print the effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server (default)
    #[command(alias = "serve")]
    Run,
    /// Validate configuration and database connectivity, then exit
    Check,
    /// Create or update the database schema
    Migrate,
    /// Load a JSON fixtures file into the database
    Seed { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.bind_addr = match config.bind_addr.rsplit_once(':') {
            Some((host, _)) => format!("{host}:{port}"),
            None => format!("0.0.0.0:{port}"),
        };
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let store: Arc<dyn ContentStore> = if cli.mock {
                info!("Using in-memory store");
                Arc::new(database::memory_store(cli.fixtures.as_deref())?)
            } else {
                Arc::new(database::open_store(&config).await?)
            };
            serve(AppState::new(config, store)).await
        }
        Commands::Check => {
            database::open_store(&config).await?;
            info!("Configuration and database OK");
            Ok(())
        }
        Commands::Migrate => {
            database::open_store(&config).await?;
            Ok(())
        }
        Commands::Seed { path } => database::seed(&config, &path).await,
    }
}
