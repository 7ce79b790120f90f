//! OS permission interfaces.

use crate::platform::BoxFuture;

use super::state::PermissionState;

/// Status reported by the OS for one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionResponse {
    pub state: PermissionState,
    /// Whether the OS will still show the in-app prompt for this scope.
    pub can_ask_again: bool,
}

impl PermissionResponse {
    pub fn new(state: PermissionState, can_ask_again: bool) -> Self {
        Self {
            state,
            can_ask_again,
        }
    }

    pub fn granted() -> Self {
        Self::new(PermissionState::Granted, true)
    }

    pub fn undetermined() -> Self {
        Self::new(PermissionState::Undetermined, true)
    }

    pub fn denied() -> Self {
        Self::new(PermissionState::Denied, true)
    }

    pub fn permanently_denied() -> Self {
        Self::new(PermissionState::Denied, false)
    }
}

/// OS location permission service.
///
/// `request_*` calls may show a system-native modal and suspend until the user
/// answers it; no timeout is imposed by the caller.
pub trait LocationPermissionService: Send + Sync {
    fn get_foreground_status(&self) -> BoxFuture<'_, PermissionResponse>;

    fn request_foreground(&self) -> BoxFuture<'_, PermissionResponse>;

    fn get_background_status(&self) -> BoxFuture<'_, PermissionResponse>;

    /// Most platforms require foreground authorization before this can
    /// succeed.
    fn request_background(&self) -> BoxFuture<'_, PermissionResponse>;
}

/// Navigates the user out of the app to the OS location settings screen.
pub trait SettingsLauncher: Send + Sync {
    /// Fire-and-forget.
    fn open(&self);
}
