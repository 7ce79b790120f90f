//! Background region monitor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::permission::PermissionGate;
use crate::region::Region;

use super::service::{GeofenceError, GeofenceRegion, GeofencingService};

/// Background task name the region handler is bound to.
pub const REGION_MONITOR_TASK: &str = "geonotify.region-monitor";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("Background location permission is required")]
    PermissionRequired,

    #[error(transparent)]
    Geofencing(#[from] GeofenceError),
}

/// Registers and unregisters the catalog with the OS geofencing facility.
///
/// Start and stop are serialized. Only the lifecycle controller drives them.
pub struct BackgroundRegionMonitor {
    geofencing: Arc<dyn GeofencingService>,
    gate: Arc<PermissionGate>,
    task_name: String,
    running: AtomicBool,
    transitions: Mutex<()>,
}

impl BackgroundRegionMonitor {
    pub fn new(geofencing: Arc<dyn GeofencingService>, gate: Arc<PermissionGate>) -> Self {
        Self::with_task_name(geofencing, gate, REGION_MONITOR_TASK)
    }

    pub fn with_task_name(
        geofencing: Arc<dyn GeofencingService>,
        gate: Arc<PermissionGate>,
        task_name: impl Into<String>,
    ) -> Self {
        Self {
            geofencing,
            gate,
            task_name: task_name.into(),
            running: AtomicBool::new(false),
            transitions: Mutex::new(()),
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    /// Register `regions` for enter/exit monitoring.
    ///
    /// Requires background permission. An existing registration under the
    /// task name is replaced.
    pub async fn start(&self, regions: &[Region]) -> Result<(), MonitorError> {
        let _guard = self.transitions.lock().await;

        if !self.gate.background_status().await.is_granted() {
            return Err(MonitorError::PermissionRequired);
        }

        if self.geofencing.is_registered(&self.task_name).await? {
            debug!(task = %self.task_name, "Replacing existing geofence registration");
            self.geofencing.unregister(&self.task_name).await?;
        }

        let fences: Vec<GeofenceRegion> = regions.iter().map(GeofenceRegion::from).collect();
        let count = fences.len();
        self.geofencing.register(&self.task_name, fences).await?;
        self.running.store(true, Ordering::SeqCst);

        info!(task = %self.task_name, regions = count, "Region monitoring started");
        Ok(())
    }

    /// Unregister monitoring. Idempotent; failures are logged, not returned.
    pub async fn stop(&self) {
        let _guard = self.transitions.lock().await;

        match self.geofencing.is_registered(&self.task_name).await {
            Ok(true) => match self.geofencing.unregister(&self.task_name).await {
                Ok(()) => info!(task = %self.task_name, "Region monitoring stopped"),
                Err(e) => {
                    warn!(task = %self.task_name, error = %e, "Failed to unregister geofences")
                }
            },
            Ok(false) => debug!(task = %self.task_name, "Region monitoring not registered"),
            Err(e) => {
                warn!(task = %self.task_name, error = %e, "Failed to query geofence registration")
            }
        }

        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
