//! OS geofencing and background task interfaces.

use std::sync::Arc;

use thiserror::Error;

use crate::platform::BoxFuture;
use crate::region::Region;

use super::event::RegionTransition;

/// Errors from the OS geofencing facility.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeofenceError {
    #[error("Geofencing unavailable: {0}")]
    Unavailable(String),

    #[error("Geofence registration failed: {0}")]
    Registration(String),
}

/// Failure the OS reports instead of a transition payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Background task error: {message}")]
pub struct BackgroundTaskError {
    pub message: String,
}

impl BackgroundTaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A region as registered with the OS.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceRegion {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub notify_on_enter: bool,
    pub notify_on_exit: bool,
}

impl From<&Region> for GeofenceRegion {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id.clone(),
            latitude: region.center_latitude,
            longitude: region.center_longitude,
            radius_meters: region.radius_meters,
            notify_on_enter: true,
            notify_on_exit: true,
        }
    }
}

/// OS geofencing facility, keyed by background task name.
pub trait GeofencingService: Send + Sync {
    fn is_registered(&self, task_name: &str) -> BoxFuture<'_, Result<bool, GeofenceError>>;

    /// Register `regions` under `task_name`.
    ///
    /// Registering a task that is already registered may duplicate
    /// deliveries; callers unregister first.
    fn register(
        &self,
        task_name: &str,
        regions: Vec<GeofenceRegion>,
    ) -> BoxFuture<'_, Result<(), GeofenceError>>;

    fn unregister(&self, task_name: &str) -> BoxFuture<'_, Result<(), GeofenceError>>;
}

/// Code the OS invokes for a background task.
pub trait BackgroundTaskHandler: Send + Sync {
    /// Handle one delivery. Must not panic or fail.
    fn handle(
        &self,
        delivery: Result<RegionTransition, BackgroundTaskError>,
    ) -> BoxFuture<'_, ()>;
}

/// Named background task registry.
pub trait BackgroundTaskRuntime: Send + Sync {
    /// Install `handler` under `task_name`. Must be called at process start.
    fn define_task(&self, task_name: &str, handler: Arc<dyn BackgroundTaskHandler>);
}
