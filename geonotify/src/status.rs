//! User-facing status derived from engine errors.
//!
//! Permission and provider failures are expected outcomes. They are turned
//! into a short message plus the one action that can fix them.

use std::fmt;

use crate::lifecycle::LifecycleError;
use crate::permission::PermissionDenial;
use crate::position::PositionError;

/// Action the user can take to resolve a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// Ask again in-app.
    RetryPrompt,
    /// Only the OS settings page can grant the permission.
    OpenSystemSettings,
    /// Device location services are switched off.
    EnableLocationServices,
}

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remediation::RetryPrompt => write!(f, "Try again"),
            Remediation::OpenSystemSettings => write!(f, "Open Settings"),
            Remediation::EnableLocationServices => write!(f, "Turn on Location Services"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStatus {
    pub message: String,
    pub remediation: Option<Remediation>,
}

impl UserStatus {
    pub fn new(message: impl Into<String>, remediation: Option<Remediation>) -> Self {
        Self {
            message: message.into(),
            remediation,
        }
    }

    /// Informational status with no action attached.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, None)
    }

    pub fn is_actionable(&self) -> bool {
        self.remediation.is_some()
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.remediation {
            Some(action) => write!(f, "{} [{}]", self.message, action),
            None => write!(f, "{}", self.message),
        }
    }
}

fn denial_remediation(denial: PermissionDenial) -> Remediation {
    if denial.needs_system_settings() {
        Remediation::OpenSystemSettings
    } else {
        Remediation::RetryPrompt
    }
}

impl From<&LifecycleError> for UserStatus {
    fn from(error: &LifecycleError) -> Self {
        match error {
            LifecycleError::ForegroundPermissionDenied(denial) => UserStatus::new(
                "Location access is needed to watch your position.",
                Some(denial_remediation(*denial)),
            ),
            LifecycleError::BackgroundPermissionDenied(denial) => UserStatus::new(
                "Allow location access \"Always\" to get notified near places of interest.",
                Some(denial_remediation(*denial)),
            ),
            LifecycleError::Cancelled => {
                UserStatus::info("Background tracking was not enabled.")
            }
            LifecycleError::Monitor(e) => UserStatus::new(
                format!("Could not start region monitoring: {}", e),
                Some(Remediation::RetryPrompt),
            ),
            LifecycleError::Config(e) => {
                UserStatus::info(format!("Could not save the setting: {}", e))
            }
        }
    }
}

impl From<&PositionError> for UserStatus {
    fn from(error: &PositionError) -> Self {
        match error {
            PositionError::ProviderUnavailable(_) => UserStatus::new(
                "Location is unavailable on this device.",
                Some(Remediation::EnableLocationServices),
            ),
            PositionError::PermissionDenied => UserStatus::new(
                "Location access is needed to watch your position.",
                Some(Remediation::OpenSystemSettings),
            ),
            PositionError::Provider(reason) => {
                UserStatus::info(format!("Location error: {}", reason))
            }
        }
    }
}
