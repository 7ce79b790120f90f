//! Simulated location authorization.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::permission::{
    LocationPermissionService, PermissionResponse, PermissionScope, SettingsLauncher,
};
use crate::platform::BoxFuture;

#[derive(Debug, Clone)]
struct ScopeSim {
    status: PermissionResponse,
    /// What the user answers when prompted; `None` dismisses as denied.
    answer: Option<PermissionResponse>,
    hold: bool,
    prompts: usize,
}

impl ScopeSim {
    fn with_status(status: PermissionResponse) -> Self {
        Self {
            status,
            answer: None,
            hold: false,
            prompts: 0,
        }
    }
}

/// OS permission dialogs with scripted answers.
pub struct SimulatedPermissions {
    foreground: Mutex<ScopeSim>,
    background: Mutex<ScopeSim>,
}

impl SimulatedPermissions {
    /// Both scopes undetermined. Prompts are dismissed as denied unless an
    /// answer is scripted.
    pub fn new() -> Self {
        Self {
            foreground: Mutex::new(ScopeSim::with_status(PermissionResponse::undetermined())),
            background: Mutex::new(ScopeSim::with_status(PermissionResponse::undetermined())),
        }
    }

    pub fn all_granted() -> Self {
        let sim = Self::new();
        sim.grant_all();
        sim
    }

    pub fn grant_all(&self) {
        self.set_status(PermissionScope::Foreground, PermissionResponse::granted());
        self.set_status(PermissionScope::Background, PermissionResponse::granted());
    }

    /// Change the current status, as if from system settings.
    pub fn set_status(&self, scope: PermissionScope, status: PermissionResponse) {
        self.scope(scope).lock().status = status;
    }

    /// Script the user's answer to subsequent prompts.
    pub fn answer_prompts(&self, scope: PermissionScope, answer: PermissionResponse) {
        self.scope(scope).lock().answer = Some(answer);
    }

    /// Leave subsequent prompts on screen forever.
    pub fn hold_prompts(&self, scope: PermissionScope) {
        self.scope(scope).lock().hold = true;
    }

    pub fn prompt_count(&self, scope: PermissionScope) -> usize {
        self.scope(scope).lock().prompts
    }

    fn scope(&self, scope: PermissionScope) -> &Mutex<ScopeSim> {
        match scope {
            PermissionScope::Foreground => &self.foreground,
            PermissionScope::Background => &self.background,
        }
    }

    fn status(&self, scope: PermissionScope) -> BoxFuture<'_, PermissionResponse> {
        let status = self.scope(scope).lock().status;
        Box::pin(async move { status })
    }

    fn prompt(&self, scope: PermissionScope) -> BoxFuture<'_, PermissionResponse> {
        Box::pin(async move {
            let held = {
                let mut sim = self.scope(scope).lock();
                sim.prompts += 1;
                if !sim.hold {
                    sim.status = sim.answer.unwrap_or_else(PermissionResponse::denied);
                }
                sim.hold
            };

            if held {
                debug!(scope = %scope, "Permission prompt held open");
                futures::future::pending::<()>().await;
            }
            self.scope(scope).lock().status
        })
    }
}

impl Default for SimulatedPermissions {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationPermissionService for SimulatedPermissions {
    fn get_foreground_status(&self) -> BoxFuture<'_, PermissionResponse> {
        self.status(PermissionScope::Foreground)
    }

    fn request_foreground(&self) -> BoxFuture<'_, PermissionResponse> {
        self.prompt(PermissionScope::Foreground)
    }

    fn get_background_status(&self) -> BoxFuture<'_, PermissionResponse> {
        self.status(PermissionScope::Background)
    }

    fn request_background(&self) -> BoxFuture<'_, PermissionResponse> {
        self.prompt(PermissionScope::Background)
    }
}

/// Counts requests to open system settings.
#[derive(Default)]
pub struct SimulatedSettingsLauncher {
    opened: AtomicUsize,
}

impl SimulatedSettingsLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl SettingsLauncher for SimulatedSettingsLauncher {
    fn open(&self) {
        self.opened.fetch_add(1, Ordering::SeqCst);
        debug!("System settings opened");
    }
}
