//! Engine bootstrap.
//!
//! `TrackingEngine` wires the configuration, permission gate, watchers and
//! lifecycle controller together in the order the OS requires: the background
//! transition handler is bound before anything else starts.
//!
//! Live position runs whenever foreground permission is granted. The engine
//! tries to start it at startup and again after every lifecycle step, since
//! enabling background tracking may be what obtained the foreground grant.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::AppError;
use crate::config::TrackingConfig;
use crate::geofence::{BackgroundRegionMonitor, RegionTransitionHandler, REGION_MONITOR_TASK};
use crate::lifecycle::{LifecycleError, LifecycleReport, TrackingLifecycleController};
use crate::permission::{PermissionDenial, PermissionGate, PermissionScope};
use crate::platform::Platform;
use crate::position::{ForegroundLocationWatcher, LocationSample, WatcherState};
use crate::region::RegionCatalog;
use crate::status::UserStatus;

/// Running region-monitoring and live-location engine.
///
/// # Example
///
/// ```ignore
/// let engine = TrackingEngine::start(platform, Arc::new(RegionCatalog::builtin()?)).await?;
///
/// engine.start_foreground().await?;
/// engine.set_background_tracking(true).await?;
///
/// // Region monitoring stays registered with the OS after shutdown
/// engine.shutdown().await;
/// ```
pub struct TrackingEngine {
    config: Arc<TrackingConfig>,
    gate: Arc<PermissionGate>,
    catalog: Arc<RegionCatalog>,
    watcher: Arc<ForegroundLocationWatcher>,
    monitor: Arc<BackgroundRegionMonitor>,
    controller: Arc<TrackingLifecycleController>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl TrackingEngine {
    /// Start the engine against `platform`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored configuration cannot be read.
    pub async fn start(platform: Platform, catalog: Arc<RegionCatalog>) -> Result<Self, AppError> {
        info!(regions = catalog.len(), "Starting tracking engine");

        // 1. The OS may have launched us only to deliver a transition
        platform.tasks.define_task(
            REGION_MONITOR_TASK,
            Arc::new(RegionTransitionHandler::new(
                Arc::clone(&catalog),
                Arc::clone(&platform.notifications),
            )),
        );
        debug!(task = REGION_MONITOR_TASK, "Region transition handler bound");

        // 2. Configuration
        let config = Arc::new(TrackingConfig::load(Arc::clone(&platform.store)).await?);

        // 3. Components
        let gate = Arc::new(PermissionGate::new(
            Arc::clone(&platform.permissions),
            Arc::clone(&platform.settings),
        ));
        let watcher = Arc::new(ForegroundLocationWatcher::new(
            Arc::clone(&platform.positions),
            Arc::clone(&gate),
            Arc::clone(&config),
        ));
        let monitor = Arc::new(BackgroundRegionMonitor::new(
            Arc::clone(&platform.geofencing),
            Arc::clone(&gate),
        ));

        let cancel = CancellationToken::new();
        let controller = Arc::new(TrackingLifecycleController::new(
            Arc::clone(&config),
            Arc::clone(&gate),
            Arc::clone(&monitor),
            Arc::clone(&catalog),
            cancel.child_token(),
        ));

        // 4. Live position, if already permitted
        if let Err(e) = watcher.start().await {
            warn!(error = %e, "Live position not started");
        }

        // 5. Background tasks
        let reports = controller.subscribe();
        let tasks = vec![
            controller.run(),
            watcher.spawn_config_follower(cancel.child_token()),
            spawn_foreground_follower(Arc::clone(&watcher), reports, cancel.child_token()),
        ];

        info!("Tracking engine started");
        Ok(Self {
            config,
            gate,
            catalog,
            watcher,
            monitor,
            controller,
            cancel,
            tasks,
        })
    }

    /// Ask for foreground permission if needed, then start live position.
    pub async fn start_foreground(&self) -> Result<WatcherState, AppError> {
        let state = self.gate.ensure_foreground_until(&self.cancel).await;
        if !state.map(|s| s.is_granted()).unwrap_or(false) {
            let denial = self
                .gate
                .denial(PermissionScope::Foreground)
                .await
                .unwrap_or(PermissionDenial::Denied);
            return Err(AppError::ForegroundPermissionDenied(denial));
        }
        Ok(self.watcher.start().await?)
    }

    /// Stop live position. Background monitoring is unaffected.
    pub async fn stop_foreground(&self) {
        self.watcher.stop().await;
    }

    /// User toggle for background tracking.
    ///
    /// Also starts live position if the toggle left foreground permission
    /// granted, whether or not enabling succeeded.
    pub async fn set_background_tracking(&self, enabled: bool) -> Result<(), LifecycleError> {
        let result = self.controller.set_background_tracking(enabled).await;
        if let Err(e) = self.watcher.start().await {
            warn!(error = %e, "Live position not started");
        }
        result
    }

    pub fn config(&self) -> &Arc<TrackingConfig> {
        &self.config
    }

    pub fn gate(&self) -> &Arc<PermissionGate> {
        &self.gate
    }

    pub fn catalog(&self) -> &Arc<RegionCatalog> {
        &self.catalog
    }

    pub fn latest_sample(&self) -> Option<LocationSample> {
        self.watcher.latest_sample()
    }

    pub fn watcher(&self) -> &Arc<ForegroundLocationWatcher> {
        &self.watcher
    }

    /// Whether region monitoring is registered with the OS.
    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_running()
    }

    pub fn lifecycle_reports(&self) -> broadcast::Receiver<LifecycleReport> {
        self.controller.subscribe()
    }

    /// Status line for the live position view, if something needs attention.
    pub fn position_status(&self) -> Option<UserStatus> {
        self.watcher.last_error().as_ref().map(UserStatus::from)
    }

    /// Cancel background tasks and release the position stream.
    ///
    /// Region monitoring is left registered so transitions keep arriving
    /// while the app is not running.
    pub async fn shutdown(self) {
        info!("Shutting down tracking engine");
        self.cancel.cancel();

        // Tasks first so none of them can reopen the stream afterwards
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Engine task ended abnormally");
            }
        }
        self.watcher.stop().await;

        info!(
            monitoring = self.monitor.is_running(),
            "Tracking engine shutdown complete"
        );
    }
}

/// Retry live position after every lifecycle report until cancelled.
///
/// The controller may obtain the foreground grant while applying a flag
/// written by someone other than the user toggle.
fn spawn_foreground_follower(
    watcher: Arc<ForegroundLocationWatcher>,
    mut reports: broadcast::Receiver<LifecycleReport>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                report = reports.recv() => match report {
                    Ok(_) | Err(RecvError::Lagged(_)) => {
                        if let Err(e) = watcher.start().await {
                            warn!(error = %e, "Live position not started");
                        }
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        debug!("Foreground follower stopped");
    })
}
