//! Simulated platform.
//!
//! Each simulator records what the engine asked of it and lets the caller
//! drive the OS side: answer permission prompts, emit position fixes, cross
//! region boundaries.
//!
//! ```ignore
//! let sim = SimulatedPlatform::new(Arc::new(MemoryStore::new()));
//! sim.permissions.grant_all();
//! let engine = TrackingEngine::start(sim.platform(), catalog).await?;
//!
//! sim.geofencing.update_position(GeoPoint::new(34.8545, 32.3663)).await;
//! assert_eq!(sim.notifier.notifications().len(), 1);
//! ```

mod geofencing;
mod notifications;
mod permissions;
mod position;

use std::sync::Arc;

use crate::config::KeyValueStore;

use super::Platform;

pub use geofencing::{SimulatedGeofencing, SimulatedTaskRuntime};
pub use notifications::RecordingNotifier;
pub use permissions::{SimulatedPermissions, SimulatedSettingsLauncher};
pub use position::SimulatedPositionStream;

/// All simulators, wired together, with concrete handles kept for driving.
#[derive(Clone)]
pub struct SimulatedPlatform {
    pub permissions: Arc<SimulatedPermissions>,
    pub settings: Arc<SimulatedSettingsLauncher>,
    pub positions: Arc<SimulatedPositionStream>,
    pub geofencing: Arc<SimulatedGeofencing>,
    pub tasks: Arc<SimulatedTaskRuntime>,
    pub notifier: Arc<RecordingNotifier>,
    pub store: Arc<dyn KeyValueStore>,
}

impl SimulatedPlatform {
    /// Fresh simulators: nothing granted, nothing registered.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let tasks = Arc::new(SimulatedTaskRuntime::new());
        Self {
            permissions: Arc::new(SimulatedPermissions::new()),
            settings: Arc::new(SimulatedSettingsLauncher::new()),
            positions: Arc::new(SimulatedPositionStream::new()),
            geofencing: Arc::new(SimulatedGeofencing::new(Arc::clone(&tasks))),
            tasks,
            notifier: Arc::new(RecordingNotifier::new()),
            store,
        }
    }

    /// Type-erased view for the engine.
    pub fn platform(&self) -> Platform {
        Platform {
            permissions: self.permissions.clone(),
            settings: self.settings.clone(),
            positions: self.positions.clone(),
            geofencing: self.geofencing.clone(),
            tasks: self.tasks.clone(),
            notifications: self.notifier.clone(),
            store: Arc::clone(&self.store),
        }
    }
}
