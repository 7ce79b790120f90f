//! CLI error handling with user-friendly messages.

use std::fmt;
use std::path::PathBuf;
use std::process;

use geonotify::config::{ConfigError, ConfigKeyError, StoreError};
use geonotify::geo::GeoError;
use geonotify::region::CatalogError;
use geonotify::AppError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to create the Tokio runtime
    Runtime(std::io::Error),
    /// Configuration error
    Config(String),
    /// Region catalog could not be loaded
    Catalog(CatalogError),
    /// Failed to read an input file
    FileRead { path: PathBuf, error: std::io::Error },
    /// Malformed line in a position trace
    Trace { line: usize, reason: String },
    /// Coordinates given on the command line are out of range
    Coordinates(GeoError),
    /// Failed to serialize JSON output
    Output(serde_json::Error),
    /// Engine failed to start
    Engine(AppError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let Some(hint) = self.hint() {
            eprintln!();
            eprintln!("{}", hint);
        }

        process::exit(1)
    }

    /// Follow-up advice printed under the error, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::Config(_) => {
                Some("Use 'geonotify config list' to see available keys and values.")
            }
            CliError::Trace { .. } => Some(concat!(
                "Each trace line must be a JSON object such as:\n",
                "  {\"latitude\":34.8545,\"longitude\":32.3663,",
                "\"accuracyMeters\":5,\"capturedAtEpochMs\":0}"
            )),
            CliError::Coordinates(_) => {
                Some("Latitude must be within -90..90 and longitude within -180..180.")
            }
            _ => None,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to create Tokio runtime: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Catalog(e) => write!(f, "Failed to load region catalog: {}", e),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read '{}': {}", path.display(), error)
            }
            CliError::Trace { line, reason } => {
                write!(f, "Invalid trace line {}: {}", line, reason)
            }
            CliError::Coordinates(e) => write!(f, "{}", e),
            CliError::Output(e) => write!(f, "Failed to write JSON output: {}", e),
            CliError::Engine(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Catalog(e) => Some(e),
            CliError::FileRead { error, .. } => Some(error),
            CliError::Coordinates(e) => Some(e),
            CliError::Output(e) => Some(e),
            CliError::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        CliError::Catalog(e)
    }
}

impl From<GeoError> for CliError {
    fn from(e: GeoError) -> Self {
        CliError::Coordinates(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::Engine(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ConfigKeyError> for CliError {
    fn from(e: ConfigKeyError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Config(e.to_string())
    }
}
