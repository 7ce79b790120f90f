//! Application error types.

use std::fmt;

use crate::config::ConfigError;
use crate::permission::PermissionDenial;
use crate::position::PositionError;

/// Errors that can occur during engine startup and foreground use.
#[derive(Debug)]
pub enum AppError {
    /// Failed to load the tracking configuration.
    Config(ConfigError),

    /// Foreground location permission was not granted.
    ForegroundPermissionDenied(PermissionDenial),

    /// The position provider refused to start.
    Position(PositionError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => {
                write!(f, "Configuration error: {}", e)
            }
            AppError::ForegroundPermissionDenied(denial) => {
                write!(f, "Foreground location permission {}", denial)
            }
            AppError::Position(e) => {
                write!(f, "Failed to start position updates: {}", e)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::ForegroundPermissionDenied(_) => None,
            AppError::Position(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<PositionError> for AppError {
    fn from(e: PositionError) -> Self {
        AppError::Position(e)
    }
}
