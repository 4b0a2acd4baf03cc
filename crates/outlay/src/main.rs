//! # Outlay CLI
//!
//! Command-line entry point for the Outlay expense service.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

mod commands;
mod config;
mod logging;

#[derive(Parser)]
#[command(name = "outlay")]
#[command(version)]
#[command(about = "Minimal expense tracking service", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the expense API server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// MongoDB connection string
        #[arg(long)]
        mongo_uri: Option<String>,

        /// Database name
        #[arg(long)]
        database: Option<String>,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "origin")]
        origins: Vec<String>,

        /// Use the in-memory store instead of MongoDB
        #[arg(long)]
        memory: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Display version info
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init(&cli.log_level, cli.json_logs);

    let cfg = config::Config::load();

    match cli.command {
        Commands::Serve {
            host,
            port,
            mongo_uri,
            database,
            origins,
            memory,
        } => {
            commands::serve(&cfg, host, port, mongo_uri, database, origins, memory).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => config::show_config(),
            ConfigAction::Path => println!("{}", config::Config::config_path().display()),
        },

        Commands::Version => commands::version(),
    }

    Ok(())
}
