//! Permission gate: query, prompt and classify location authorization.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::service::{LocationPermissionService, PermissionResponse, SettingsLauncher};
use super::state::{PermissionDenial, PermissionScope, PermissionState};

/// Single point of access to OS location authorization.
///
/// # Example
///
/// ```ignore
/// let gate = PermissionGate::new(permissions, settings);
///
/// if gate.ensure_foreground().await.is_granted() {
///     // safe to start the foreground watcher
/// }
/// ```
pub struct PermissionGate {
    service: Arc<dyn LocationPermissionService>,
    settings: Arc<dyn SettingsLauncher>,
}

impl PermissionGate {
    pub fn new(
        service: Arc<dyn LocationPermissionService>,
        settings: Arc<dyn SettingsLauncher>,
    ) -> Self {
        Self { service, settings }
    }

    /// Current foreground grant, always re-queried from the OS.
    pub async fn foreground_status(&self) -> PermissionState {
        self.service.get_foreground_status().await.state
    }

    /// Current background grant, always re-queried from the OS.
    pub async fn background_status(&self) -> PermissionState {
        self.service.get_background_status().await.state
    }

    /// Ensure foreground authorization, prompting if not already granted.
    pub async fn ensure_foreground(&self) -> PermissionState {
        self.ensure(PermissionScope::Foreground).await
    }

    /// Ensure background authorization, prompting if not already granted.
    ///
    /// Call [`ensure_foreground`](Self::ensure_foreground) first.
    pub async fn ensure_background(&self) -> PermissionState {
        self.ensure(PermissionScope::Background).await
    }

    /// Like [`ensure_foreground`](Self::ensure_foreground), but gives up when
    /// `cancel` fires while the prompt is pending.
    ///
    /// Returns `None` if cancelled.
    pub async fn ensure_foreground_until(
        &self,
        cancel: &CancellationToken,
    ) -> Option<PermissionState> {
        self.ensure_until(PermissionScope::Foreground, cancel).await
    }

    /// Cancellable variant of [`ensure_background`](Self::ensure_background).
    pub async fn ensure_background_until(
        &self,
        cancel: &CancellationToken,
    ) -> Option<PermissionState> {
        self.ensure_until(PermissionScope::Background, cancel).await
    }

    /// Classify a scope that is not granted.
    ///
    /// Returns `None` if the scope is currently granted.
    pub async fn denial(&self, scope: PermissionScope) -> Option<PermissionDenial> {
        let response = self.status_of(scope).await;
        if response.state.is_granted() {
            return None;
        }
        if response.state == PermissionState::Denied && !response.can_ask_again {
            Some(PermissionDenial::PermanentlyDenied)
        } else {
            Some(PermissionDenial::Denied)
        }
    }

    /// Send the user to the OS settings page for this app.
    pub fn open_system_settings(&self) {
        info!("Opening system location settings");
        self.settings.open();
    }

    async fn ensure(&self, scope: PermissionScope) -> PermissionState {
        let current = self.status_of(scope).await;
        if current.state.is_granted() {
            return current.state;
        }

        if current.state == PermissionState::Denied && !current.can_ask_again {
            // The OS would not show a dialog anyway
            debug!(%scope, "Permission permanently denied, skipping prompt");
            return current.state;
        }

        debug!(%scope, current = %current.state, "Requesting location permission");
        let response = self.request(scope).await;
        if response.state.is_granted() {
            info!(%scope, "Location permission granted");
        } else {
            warn!(
                %scope,
                state = %response.state,
                can_ask_again = response.can_ask_again,
                "Location permission not granted"
            );
        }
        response.state
    }

    async fn ensure_until(
        &self,
        scope: PermissionScope,
        cancel: &CancellationToken,
    ) -> Option<PermissionState> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%scope, "Permission prompt abandoned");
                None
            }
            state = self.ensure(scope) => Some(state),
        }
    }

    async fn status_of(&self, scope: PermissionScope) -> PermissionResponse {
        match scope {
            PermissionScope::Foreground => self.service.get_foreground_status().await,
            PermissionScope::Background => self.service.get_background_status().await,
        }
    }

    async fn request(&self, scope: PermissionScope) -> PermissionResponse {
        match scope {
            PermissionScope::Foreground => self.service.request_foreground().await,
            PermissionScope::Background => self.service.request_background().await,
        }
    }
}
