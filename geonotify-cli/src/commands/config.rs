//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path` for
//! the tracking settings.

use std::path::Path;
use std::sync::Arc;

use clap::Subcommand;
use console::style;
use geonotify::config::{ConfigKey, IniFileStore, TrackingConfig};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key (e.g., tracking.min_distance_meters)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., tracking.min_distance_meters)
        key: String,

        /// Value to set; numbers are clamped to their allowed range
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub async fn run(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key, path).await,
        ConfigCommands::Set { key, value } => run_set(&key, &value, path).await,
        ConfigCommands::List => run_list(path).await,
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

async fn open(path: &Path) -> Result<TrackingConfig, CliError> {
    let store = Arc::new(IniFileStore::open(path)?);
    Ok(TrackingConfig::load(store).await?)
}

async fn run_get(key: &str, path: &Path) -> Result<(), CliError> {
    let key: ConfigKey = key.parse()?;
    let config = open(path).await?;
    println!("{}", key.get(&config.snapshot()));
    Ok(())
}

async fn run_set(key: &str, value: &str, path: &Path) -> Result<(), CliError> {
    let key: ConfigKey = key.parse()?;
    let config = open(path).await?;
    config.set_raw(key, value).await?;

    // Print the stored value, which may have been clamped
    println!("Set {} = {}", key.name(), key.get(&config.snapshot()));
    Ok(())
}

async fn run_list(path: &Path) -> Result<(), CliError> {
    let config = open(path).await?;
    let settings = config.snapshot();

    println!("{}", style("Tracking Settings").bold().underlined());
    println!();
    for key in ConfigKey::all() {
        println!(
            "  {} = {}",
            style(key.name()).cyan(),
            key.get(&settings)
        );
        println!("      {}", style(key.description()).dim());
    }
    println!();
    println!("File: {}", path.display());

    Ok(())
}
