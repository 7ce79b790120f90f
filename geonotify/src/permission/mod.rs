//! Location authorization.
//!
//! The [`PermissionGate`] is the only component that talks to the OS
//! permission service. Other components read status through it but never
//! change it directly.
//!
//! Statuses are never cached: the user can revoke or grant location access
//! from the system settings at any time, so every query goes back to the OS.

mod gate;
mod service;
mod state;

pub use gate::PermissionGate;
pub use service::{LocationPermissionService, PermissionResponse, SettingsLauncher};
pub use state::{PermissionDenial, PermissionScope, PermissionState};
