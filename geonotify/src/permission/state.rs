//! Permission state types.

use std::fmt;
use std::str::FromStr;

/// Tri-state authorization status for a single scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PermissionState {
    /// The user has not been asked yet.
    #[default]
    Undetermined,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionState::Undetermined => write!(f, "undetermined"),
            PermissionState::Granted => write!(f, "granted"),
            PermissionState::Denied => write!(f, "denied"),
        }
    }
}

impl FromStr for PermissionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "undetermined" => Ok(PermissionState::Undetermined),
            "granted" => Ok(PermissionState::Granted),
            "denied" => Ok(PermissionState::Denied),
            other => Err(format!(
                "unknown permission state '{}' (expected undetermined, granted or denied)",
                other
            )),
        }
    }
}

/// Which authorization a status refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionScope {
    /// Location while the app is in use.
    Foreground,
    /// Location and geofence callbacks while the app is suspended.
    Background,
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionScope::Foreground => write!(f, "foreground"),
            PermissionScope::Background => write!(f, "background"),
        }
    }
}

/// Why a scope is not granted, from the user's remediation point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDenial {
    /// Not granted, but the in-app prompt can be shown again.
    Denied,
    /// The OS will no longer show the prompt; only system settings can help.
    PermanentlyDenied,
}

impl PermissionDenial {
    pub fn needs_system_settings(&self) -> bool {
        matches!(self, PermissionDenial::PermanentlyDenied)
    }
}

impl fmt::Display for PermissionDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionDenial::Denied => write!(f, "denied"),
            PermissionDenial::PermanentlyDenied => write!(f, "permanently denied"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_undetermined() {
        assert_eq!(PermissionState::default(), PermissionState::Undetermined);
    }

    #[test]
    fn test_parse_round_trip() {
        for state in [
            PermissionState::Undetermined,
            PermissionState::Granted,
            PermissionState::Denied,
        ] {
            assert_eq!(state.to_string().parse::<PermissionState>(), Ok(state));
        }
        assert_eq!("GRANTED".parse(), Ok(PermissionState::Granted));
        assert!("maybe".parse::<PermissionState>().is_err());
    }

    #[test]
    fn test_needs_system_settings() {
        assert!(PermissionDenial::PermanentlyDenied.needs_system_settings());
        assert!(!PermissionDenial::Denied.needs_system_settings());
    }
}
