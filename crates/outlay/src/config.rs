//! Configuration management for the Outlay CLI.
//!
//! Configuration is loaded from (in order of precedence):
//! 1. Command-line arguments
//! 2. Environment variables (OUTLAY_*)
//! 3. Config file (~/.config/outlay/config.toml)
//! 4. Default values

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// MongoDB connection string.
    #[serde(default = "default_mongo_uri")]
    pub mongo_uri: String,

    /// Database holding the expense collection.
    #[serde(default = "default_database")]
    pub database: String,

    /// Server host.
    #[serde(default = "default_host")]
    pub server_host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub server_port: u16,

    /// Origins allowed by the CORS policy.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_mongo_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database() -> String {
    "outlay".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongo_uri: default_mongo_uri(),
            database: default_database(),
            server_host: default_host(),
            server_port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Config {
    /// Loads configuration from all sources.
    ///
    /// Reports warnings for configuration errors but falls back to defaults.
    pub fn load() -> Self {
        let config_path = Self::config_path();

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("OUTLAY_"));

        match figment.extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("\x1b[33mWarning:\x1b[0m Configuration error, using defaults");
                eprintln!("  Config file: {}", config_path.display());
                eprintln!("  Error: {}", e);
                Config::default()
            }
        }
    }

    /// Returns the path to the config file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("outlay")
            .join("config.toml")
    }
}

/// Prints the current configuration and its sources.
pub fn show_config() {
    let config = Config::load();
    let config_path = Config::config_path();

    println!("Outlay Configuration");
    println!("====================\n");

    println!("Config file: {}", config_path.display());
    if config_path.exists() {
        println!("Status: Found\n");
    } else {
        println!("Status: Not found (using defaults)\n");
    }

    println!("Current settings:");
    println!("  mongo_uri: {}", config.mongo_uri);
    println!("  database: {}", config.database);
    println!("  server_host: {}", config.server_host);
    println!("  server_port: {}", config.server_port);
    println!("  allowed_origins: {}", config.allowed_origins.join(", "));

    println!("\nEnvironment variables:");
    println!("  OUTLAY_MONGO_URI");
    println!("  OUTLAY_DATABASE");
    println!("  OUTLAY_SERVER_HOST");
    println!("  OUTLAY_SERVER_PORT");
    println!("  OUTLAY_ALLOWED_ORIGINS");
}
