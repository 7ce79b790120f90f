//! GeoNotify CLI - Command-line interface
//!
//! Inspect the region catalog, edit tracking settings, and replay position
//! traces through the engine on the simulated platform.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::regions::RegionsArgs;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "geonotify")]
#[command(version, about = "Point-of-interest notifications and live location", long_about = None)]
struct Cli {
    /// Region catalog JSON file (defaults to the built-in catalog)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Configuration file (defaults to ~/.geonotify/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the regions of interest
    Regions(RegionsArgs),

    /// View or change tracking settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Replay a JSON-lines position trace through the engine
    Simulate(SimulateArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let config_path = cli
        .config
        .unwrap_or_else(geonotify::config::config_file_path);

    match cli.command {
        Commands::Regions(args) => commands::regions::run(args, cli.catalog.as_deref()),
        Commands::Config { command } => {
            runtime.block_on(commands::config::run(command, &config_path))
        }
        Commands::Simulate(args) => {
            runtime.block_on(commands::simulate::run(args, cli.catalog.as_deref()))
        }
    }
}
