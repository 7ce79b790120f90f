//! Background tracking lifecycle controller.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, TrackingConfig};
use crate::geofence::{BackgroundRegionMonitor, MonitorError};
use crate::permission::{PermissionDenial, PermissionGate, PermissionScope};
use crate::region::RegionCatalog;
use crate::status::UserStatus;

const REPORT_CHANNEL_CAPACITY: usize = 16;

/// Why enabling background tracking failed.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Foreground location permission {0}")]
    ForegroundPermissionDenied(PermissionDenial),

    #[error("Background location permission {0}")]
    BackgroundPermissionDenied(PermissionDenial),

    #[error("Cancelled while waiting for a permission prompt")]
    Cancelled,

    #[error("Region monitor failed: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Published after every applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleReport {
    MonitoringStarted { regions: usize },
    MonitoringStopped,
    /// Enabling failed and the flag was reverted to `false`.
    EnableFailed { status: UserStatus },
}

/// Applies the background-tracking flag to the region monitor.
///
/// Transitions are serialized: a stop always completes before a following
/// start begins, and applying the value already in effect does nothing.
/// Pending permission prompts are abandoned when the cancellation token
/// passed at construction fires.
pub struct TrackingLifecycleController {
    config: Arc<TrackingConfig>,
    gate: Arc<PermissionGate>,
    monitor: Arc<BackgroundRegionMonitor>,
    catalog: Arc<RegionCatalog>,
    /// Last value applied; `None` until the first transition.
    applied: Mutex<Option<bool>>,
    reports: broadcast::Sender<LifecycleReport>,
    cancel: CancellationToken,
}

impl TrackingLifecycleController {
    pub fn new(
        config: Arc<TrackingConfig>,
        gate: Arc<PermissionGate>,
        monitor: Arc<BackgroundRegionMonitor>,
        catalog: Arc<RegionCatalog>,
        cancel: CancellationToken,
    ) -> Self {
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        Self {
            config,
            gate,
            monitor,
            catalog,
            applied: Mutex::new(None),
            reports,
            cancel,
        }
    }

    /// User toggle: persist the flag and apply it.
    ///
    /// On failure the flag has been reverted to `false` and the reason is
    /// returned.
    pub async fn set_background_tracking(&self, enabled: bool) -> Result<(), LifecycleError> {
        let mut applied = self.applied.lock().await;
        self.config.set_background_tracking(enabled).await?;
        self.apply_locked(&mut applied, enabled).await
    }

    /// Apply the flag's current value.
    pub async fn sync(&self) -> Result<(), LifecycleError> {
        let mut applied = self.applied.lock().await;
        let enabled = self.config.background_tracking_enabled();
        self.apply_locked(&mut applied, enabled).await
    }

    /// Follow the flag, whoever writes it, until cancelled.
    ///
    /// Applies the current value immediately.
    pub fn run(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        let mut settings = self.config.subscribe();

        tokio::spawn(async move {
            settings.borrow_and_update();
            loop {
                // Failures are already reported on the broadcast channel
                if let Err(e) = controller.sync().await {
                    debug!(error = %e, "Background tracking not enabled");
                }

                tokio::select! {
                    biased;
                    _ = controller.cancel.cancelled() => break,
                    changed = settings.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        settings.borrow_and_update();
                    }
                }
            }
            debug!("Lifecycle controller stopped");
        })
    }

    /// Receive a report for every applied transition.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleReport> {
        self.reports.subscribe()
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_running()
    }

    async fn apply_locked(
        &self,
        applied: &mut Option<bool>,
        enabled: bool,
    ) -> Result<(), LifecycleError> {
        if self.config.background_tracking_enabled() != enabled {
            debug!(enabled, "Superseded by a newer flag value");
            return Ok(());
        }
        if *applied == Some(enabled) {
            return Ok(());
        }

        if !enabled {
            self.monitor.stop().await;
            *applied = Some(false);
            self.publish(LifecycleReport::MonitoringStopped);
            return Ok(());
        }

        match self.enable().await {
            Ok(regions) => {
                *applied = Some(true);
                info!(regions, "Background tracking enabled");
                self.publish(LifecycleReport::MonitoringStarted { regions });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to enable background tracking, reverting");
                if let Err(revert) = self.config.set_background_tracking(false).await {
                    warn!(error = %revert, "Failed to revert background tracking flag");
                }
                // A registration left over from an earlier run must not outlive the revert
                self.monitor.stop().await;
                *applied = Some(false);
                self.publish(LifecycleReport::EnableFailed {
                    status: UserStatus::from(&e),
                });
                Err(e)
            }
        }
    }

    async fn enable(&self) -> Result<usize, LifecycleError> {
        let foreground = self
            .gate
            .ensure_foreground_until(&self.cancel)
            .await
            .ok_or(LifecycleError::Cancelled)?;
        if !foreground.is_granted() {
            return Err(LifecycleError::ForegroundPermissionDenied(
                self.denial(PermissionScope::Foreground).await,
            ));
        }

        let background = self
            .gate
            .ensure_background_until(&self.cancel)
            .await
            .ok_or(LifecycleError::Cancelled)?;
        if !background.is_granted() {
            return Err(LifecycleError::BackgroundPermissionDenied(
                self.denial(PermissionScope::Background).await,
            ));
        }

        let regions = self.catalog.list_regions();
        self.monitor.start(regions).await?;
        Ok(regions.len())
    }

    async fn denial(&self, scope: PermissionScope) -> PermissionDenial {
        self.gate
            .denial(scope)
            .await
            .unwrap_or(PermissionDenial::Denied)
    }

    fn publish(&self, report: LifecycleReport) {
        // No subscribers is fine
        let _ = self.reports.send(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemoryStore, TrackingSettings};
    use crate::geofence::{GeofenceRegion, GeofencingService, REGION_MONITOR_TASK};
    use crate::permission::PermissionResponse;
    use crate::platform::sim::{
        SimulatedGeofencing, SimulatedPermissions, SimulatedSettingsLauncher,
        SimulatedTaskRuntime,
    };
    use crate::region::Region;
    use std::time::Duration;

    struct Harness {
        permissions: Arc<SimulatedPermissions>,
        geofencing: Arc<SimulatedGeofencing>,
        config: Arc<TrackingConfig>,
        controller: Arc<TrackingLifecycleController>,
        cancel: CancellationToken,
    }

    fn harness(permissions: SimulatedPermissions) -> Harness {
        let permissions = Arc::new(permissions);
        let gate = Arc::new(PermissionGate::new(
            permissions.clone(),
            Arc::new(SimulatedSettingsLauncher::new()),
        ));
        let geofencing = Arc::new(SimulatedGeofencing::new(Arc::new(SimulatedTaskRuntime::new())));
        let monitor = Arc::new(BackgroundRegionMonitor::new(geofencing.clone(), gate.clone()));
        let config = Arc::new(TrackingConfig::with_settings(
            Arc::new(MemoryStore::new()),
            TrackingSettings::default(),
        ));
        let catalog = Arc::new(
            RegionCatalog::new(vec![
                Region::new("coral-bay", "Coral Bay", 34.8545, 32.3663, 350.0),
                Region::new("kourion", "Kourion", 34.6641, 32.8876, 500.0),
            ])
            .unwrap(),
        );
        let cancel = CancellationToken::new();
        let controller = Arc::new(TrackingLifecycleController::new(
            config.clone(),
            gate,
            monitor,
            catalog,
            cancel.clone(),
        ));
        Harness {
            permissions,
            geofencing,
            config,
            controller,
            cancel,
        }
    }

    #[tokio::test]
    async fn test_enable_starts_monitor() {
        let h = harness(SimulatedPermissions::all_granted());
        let mut reports = h.controller.subscribe();

        h.controller.set_background_tracking(true).await.unwrap();

        assert!(h.controller.is_monitoring());
        assert!(h.config.background_tracking_enabled());
        assert_eq!(
            reports.recv().await.unwrap(),
            LifecycleReport::MonitoringStarted { regions: 2 }
        );
    }

    #[tokio::test]
    async fn test_enable_twice_registers_once() {
        let h = harness(SimulatedPermissions::all_granted());
        h.controller.set_background_tracking(true).await.unwrap();
        h.controller.set_background_tracking(true).await.unwrap();

        assert_eq!(h.geofencing.registration_count(REGION_MONITOR_TASK), 1);
        assert_eq!(h.permissions.prompt_count(PermissionScope::Background), 0);
    }

    #[tokio::test]
    async fn test_background_denied_reverts_flag() {
        let permissions = SimulatedPermissions::all_granted();
        permissions.set_status(PermissionScope::Background, PermissionResponse::undetermined());
        permissions.answer_prompts(PermissionScope::Background, PermissionResponse::denied());
        let h = harness(permissions);

        let result = h.controller.set_background_tracking(true).await;
        assert!(matches!(
            result,
            Err(LifecycleError::BackgroundPermissionDenied(PermissionDenial::Denied))
        ));
        assert!(!h.config.background_tracking_enabled());
        assert!(!h.controller.is_monitoring());
        assert_eq!(h.geofencing.registration_count(REGION_MONITOR_TASK), 0);
    }

    #[tokio::test]
    async fn test_failed_enable_removes_stale_registration() {
        let permissions = SimulatedPermissions::all_granted();
        permissions.set_status(
            PermissionScope::Background,
            PermissionResponse::permanently_denied(),
        );
        let h = harness(permissions);
        h.geofencing
            .register(
                REGION_MONITOR_TASK,
                vec![GeofenceRegion::from(&Region::new(
                    "coral-bay",
                    "Coral Bay",
                    34.8545,
                    32.3663,
                    350.0,
                ))],
            )
            .await
            .unwrap();

        let result = h.controller.set_background_tracking(true).await;
        assert!(matches!(
            result,
            Err(LifecycleError::BackgroundPermissionDenied(
                PermissionDenial::PermanentlyDenied
            ))
        ));
        assert!(!h.controller.is_monitoring());
        assert_eq!(h.geofencing.registration_count(REGION_MONITOR_TASK), 0);
    }

    #[tokio::test]
    async fn test_foreground_permanently_denied() {
        let permissions = SimulatedPermissions::new();
        permissions.set_status(
            PermissionScope::Foreground,
            PermissionResponse::permanently_denied(),
        );
        let h = harness(permissions);
        let mut reports = h.controller.subscribe();

        let result = h.controller.set_background_tracking(true).await;
        assert!(matches!(
            result,
            Err(LifecycleError::ForegroundPermissionDenied(
                PermissionDenial::PermanentlyDenied
            ))
        ));
        // Background is never asked for
        assert_eq!(h.permissions.prompt_count(PermissionScope::Background), 0);

        match reports.recv().await.unwrap() {
            LifecycleReport::EnableFailed { status } => {
                assert_eq!(
                    status.remediation,
                    Some(crate::status::Remediation::OpenSystemSettings)
                );
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_disable_stops_monitor() {
        let h = harness(SimulatedPermissions::all_granted());
        h.controller.set_background_tracking(true).await.unwrap();
        h.controller.set_background_tracking(false).await.unwrap();

        assert!(!h.controller.is_monitoring());
        assert_eq!(h.geofencing.registration_count(REGION_MONITOR_TASK), 0);
    }

    #[tokio::test]
    async fn test_pending_prompt_abandoned_on_cancel() {
        let permissions = SimulatedPermissions::new();
        permissions.hold_prompts(PermissionScope::Foreground);
        let h = harness(permissions);

        let controller = h.controller.clone();
        let toggle = tokio::spawn(async move { controller.set_background_tracking(true).await });

        tokio::time::timeout(Duration::from_secs(2), async {
            while h.permissions.prompt_count(PermissionScope::Foreground) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        h.cancel.cancel();

        let result = toggle.await.unwrap();
        assert!(matches!(result, Err(LifecycleError::Cancelled)));
        assert!(!h.config.background_tracking_enabled());
    }

    #[tokio::test]
    async fn test_run_follows_external_writes() {
        let h = harness(SimulatedPermissions::all_granted());
        let mut reports = h.controller.subscribe();
        let task = h.controller.run();

        // Initial value false: stop applied once
        assert_eq!(
            reports.recv().await.unwrap(),
            LifecycleReport::MonitoringStopped
        );

        h.config.set_background_tracking(true).await.unwrap();
        assert_eq!(
            tokio::time::timeout(Duration::from_secs(2), reports.recv())
                .await
                .unwrap()
                .unwrap(),
            LifecycleReport::MonitoringStarted { regions: 2 }
        );
        assert!(h.controller.is_monitoring());

        h.cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_run_reverts_external_write_on_denial() {
        let permissions = SimulatedPermissions::all_granted();
        permissions.set_status(PermissionScope::Background, PermissionResponse::denied());
        let h = harness(permissions);
        let mut reports = h.controller.subscribe();
        let task = h.controller.run();
        reports.recv().await.unwrap();

        h.config.set_background_tracking(true).await.unwrap();
        let report = tokio::time::timeout(Duration::from_secs(2), reports.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(report, LifecycleReport::EnableFailed { .. }));
        assert!(!h.config.background_tracking_enabled());

        h.cancel.cancel();
        task.await.unwrap();
    }
}
