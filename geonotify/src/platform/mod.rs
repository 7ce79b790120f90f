//! Host platform seams.
//!
//! Everything the engine needs from the operating system is reached through a
//! dyn-compatible trait object held by [`Platform`]. Async trait methods return
//! [`BoxFuture`] so the traits stay object-safe without extra macro crates.
//!
//! [`sim`] provides in-process implementations of every trait, used by the
//! tests and by the `geonotify simulate` command.

pub mod sim;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::KeyValueStore;
use crate::geofence::{BackgroundTaskRuntime, GeofencingService, NotificationService};
use crate::permission::{LocationPermissionService, SettingsLauncher};
use crate::position::PositionStreamService;

/// Boxed future for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The set of OS services the engine runs against.
#[derive(Clone)]
pub struct Platform {
    pub permissions: Arc<dyn LocationPermissionService>,
    pub settings: Arc<dyn SettingsLauncher>,
    pub positions: Arc<dyn PositionStreamService>,
    pub geofencing: Arc<dyn GeofencingService>,
    pub tasks: Arc<dyn BackgroundTaskRuntime>,
    pub notifications: Arc<dyn NotificationService>,
    pub store: Arc<dyn KeyValueStore>,
}
