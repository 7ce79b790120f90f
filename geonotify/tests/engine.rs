//! End-to-end tests of the tracking engine on the simulated platform.

use std::sync::Arc;
use std::time::Duration;

use geonotify::config::{KeyValueStore, MemoryStore};
use geonotify::geo::GeoPoint;
use geonotify::geofence::{
    BackgroundTaskError, GeofenceRegion, GeofencingService, TransitionKind, REGION_MONITOR_TASK,
};
use geonotify::lifecycle::{LifecycleError, LifecycleReport};
use geonotify::permission::{PermissionDenial, PermissionResponse, PermissionScope};
use geonotify::platform::sim::SimulatedPlatform;
use geonotify::position::{LocationSample, WatcherState};
use geonotify::region::{Region, RegionCatalog};
use geonotify::{AppError, TrackingEngine};

fn catalog() -> Arc<RegionCatalog> {
    Arc::new(
        RegionCatalog::new(vec![
            Region::new("coral-bay", "Coral Bay", 34.8545, 32.3663, 350.0),
            Region::new("kourion", "Kourion", 34.6641, 32.8876, 500.0),
        ])
        .unwrap(),
    )
}

fn granted_platform() -> SimulatedPlatform {
    let sim = SimulatedPlatform::new(Arc::new(MemoryStore::new()));
    sim.permissions.grant_all();
    sim
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_handler_bound_before_anything_else() {
    let sim = granted_platform();
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();

    assert!(sim.tasks.is_defined(REGION_MONITOR_TASK));
    assert_eq!(sim.tasks.task_count(), 1);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_coral_bay_enter_notifies_once() {
    let sim = granted_platform();
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();
    engine.set_background_tracking(true).await.unwrap();

    let delivered = sim.geofencing.trigger("coral-bay", TransitionKind::Enter).await;
    assert_eq!(delivered, 1);

    let sent = sim.notifier.notifications();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Entered Coral Bay");
    assert_eq!(sent[0].body, "You have entered Coral Bay.");
    assert_eq!(sent[0].data.region_id, "coral-bay");
    assert_eq!(sent[0].data.transition_kind, TransitionKind::Enter);

    let json = serde_json::to_value(&sent[0].data).unwrap();
    assert_eq!(json["transitionKind"], "Enter");
    engine.shutdown().await;
}

#[tokio::test]
async fn test_walk_through_region() {
    let sim = granted_platform();
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();
    engine.set_background_tracking(true).await.unwrap();

    sim.geofencing
        .update_position(GeoPoint::new(34.8620, 32.3663))
        .await;
    sim.geofencing
        .update_position(GeoPoint::new(34.8545, 32.3663))
        .await;
    sim.geofencing
        .update_position(GeoPoint::new(34.8450, 32.3663))
        .await;

    let titles: Vec<String> = sim
        .notifier
        .notifications()
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(titles, vec!["Entered Coral Bay", "Left Coral Bay"]);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_repeated_enable_keeps_single_registration() {
    let sim = granted_platform();
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();

    engine.set_background_tracking(true).await.unwrap();
    engine.set_background_tracking(false).await.unwrap();
    engine.set_background_tracking(true).await.unwrap();
    engine.set_background_tracking(true).await.unwrap();

    assert_eq!(sim.geofencing.registration_count(REGION_MONITOR_TASK), 1);
    sim.geofencing.trigger("kourion", TransitionKind::Exit).await;
    assert_eq!(sim.notifier.notifications().len(), 1);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_background_denial_rolls_back() {
    let sim = SimulatedPlatform::new(Arc::new(MemoryStore::new()));
    sim.permissions
        .answer_prompts(PermissionScope::Foreground, PermissionResponse::granted());
    sim.permissions
        .answer_prompts(PermissionScope::Background, PermissionResponse::denied());
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();

    let result = engine.set_background_tracking(true).await;
    assert!(matches!(
        result,
        Err(LifecycleError::BackgroundPermissionDenied(PermissionDenial::Denied))
    ));
    assert!(!engine.config().background_tracking_enabled());
    assert!(!engine.is_monitoring());
    assert_eq!(sim.geofencing.registration_count(REGION_MONITOR_TASK), 0);

    // Reverted value is persisted
    assert_eq!(
        sim.store.get("tracking.background_enabled").await.unwrap(),
        Some("false".to_string())
    );
    engine.shutdown().await;
}

#[tokio::test]
async fn test_revoked_background_permission_clears_old_registration() {
    let store = Arc::new(MemoryStore::with_entries([(
        "tracking.background_enabled",
        "true",
    )]));
    let sim = SimulatedPlatform::new(store);
    sim.permissions.grant_all();
    sim.permissions.set_status(
        PermissionScope::Background,
        PermissionResponse::permanently_denied(),
    );

    // Left registered by a previous run
    let fences = catalog().list_regions().iter().map(GeofenceRegion::from).collect();
    sim.geofencing
        .register(REGION_MONITOR_TASK, fences)
        .await
        .unwrap();

    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();
    wait_until(|| sim.geofencing.registration_count(REGION_MONITOR_TASK) == 0).await;
    wait_until(|| !engine.config().background_tracking_enabled()).await;
    assert!(!engine.is_monitoring());

    assert_eq!(sim.geofencing.trigger("coral-bay", TransitionKind::Enter).await, 0);
    assert!(sim.notifier.notifications().is_empty());
    engine.shutdown().await;
}

#[tokio::test]
async fn test_live_position_starts_when_already_permitted() {
    let sim = granted_platform();
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();
    engine.set_background_tracking(true).await.unwrap();

    assert_eq!(engine.watcher().state(), WatcherState::Watching);
    assert_eq!(sim.positions.watch_count(), 1);

    let fix = LocationSample::new(34.8545, 32.3663, 5.0, 1_000);
    sim.positions.emit(fix);
    assert_eq!(engine.latest_sample(), Some(fix));
    engine.shutdown().await;
}

#[tokio::test]
async fn test_background_toggle_grant_starts_live_position() {
    let sim = SimulatedPlatform::new(Arc::new(MemoryStore::new()));
    sim.permissions
        .answer_prompts(PermissionScope::Foreground, PermissionResponse::granted());
    sim.permissions
        .answer_prompts(PermissionScope::Background, PermissionResponse::denied());
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();
    assert_eq!(engine.watcher().state(), WatcherState::Stopped);

    // Background is refused but the foreground grant from the same toggle stands
    assert!(engine.set_background_tracking(true).await.is_err());
    assert_eq!(engine.watcher().state(), WatcherState::Watching);
    assert_eq!(sim.positions.active_count(), 1);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_external_enable_starts_live_position() {
    let sim = SimulatedPlatform::new(Arc::new(MemoryStore::new()));
    sim.permissions
        .answer_prompts(PermissionScope::Foreground, PermissionResponse::granted());
    sim.permissions
        .answer_prompts(PermissionScope::Background, PermissionResponse::granted());
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();
    assert_eq!(sim.positions.watch_count(), 0);

    engine.config().set_background_tracking(true).await.unwrap();
    wait_until(|| engine.watcher().state() == WatcherState::Watching).await;
    assert!(engine.is_monitoring());
    engine.shutdown().await;
}

#[tokio::test]
async fn test_persisted_flag_restores_monitoring_on_start() {
    let store = Arc::new(MemoryStore::with_entries([(
        "tracking.background_enabled",
        "true",
    )]));
    let sim = SimulatedPlatform::new(store);
    sim.permissions.grant_all();

    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();
    wait_until(|| engine.is_monitoring()).await;
    assert_eq!(sim.geofencing.registration_count(REGION_MONITOR_TASK), 1);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_external_config_write_is_applied() {
    let sim = granted_platform();
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();
    let mut reports = engine.lifecycle_reports();

    engine.config().set_background_tracking(true).await.unwrap();

    let started = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Ok(LifecycleReport::MonitoringStarted { regions }) = reports.recv().await {
                return regions;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(started, 2);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_foreground_filters_and_follows_config() {
    let sim = granted_platform();
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();
    assert_eq!(engine.start_foreground().await.unwrap(), WatcherState::Watching);

    let first = LocationSample::new(35.000, 33.000, 5.0, 0);
    sim.positions.emit(first);
    sim.positions.emit(LocationSample::new(35.002, 33.000, 5.0, 500));
    assert_eq!(engine.latest_sample(), Some(first));

    let later = LocationSample::new(35.002, 33.000, 5.0, 5_000);
    sim.positions.emit(later);
    assert_eq!(engine.latest_sample(), Some(later));

    assert_eq!(engine.config().set_min_distance(5.0).await.unwrap(), 10.0);
    wait_until(|| sim.positions.watch_count() == 2).await;
    assert_eq!(sim.positions.active_count(), 1);
    assert_eq!(
        sim.positions.last_options().unwrap().min_distance_meters,
        10.0
    );

    engine.shutdown().await;
    assert_eq!(sim.positions.active_count(), 0);
}

#[tokio::test]
async fn test_foreground_denied() {
    let sim = SimulatedPlatform::new(Arc::new(MemoryStore::new()));
    sim.permissions.set_status(
        PermissionScope::Foreground,
        PermissionResponse::permanently_denied(),
    );
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();

    match engine.start_foreground().await {
        Err(AppError::ForegroundPermissionDenied(PermissionDenial::PermanentlyDenied)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(sim.positions.watch_count(), 0);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_leaves_monitor_registered() {
    let sim = granted_platform();
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();
    engine.set_background_tracking(true).await.unwrap();
    engine.shutdown().await;

    assert_eq!(sim.geofencing.registration_count(REGION_MONITOR_TASK), 1);

    // Transitions still reach the handler bound at startup
    sim.geofencing.trigger("coral-bay", TransitionKind::Enter).await;
    assert_eq!(sim.notifier.notifications().len(), 1);
}

#[tokio::test]
async fn test_background_error_delivery_is_harmless() {
    let sim = granted_platform();
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();

    assert!(
        sim.geofencing
            .deliver_error(REGION_MONITOR_TASK, BackgroundTaskError::new("no fix"))
            .await
    );
    assert!(sim.notifier.notifications().is_empty());
    engine.shutdown().await;
}

#[tokio::test]
async fn test_settings_deep_link() {
    let sim = granted_platform();
    let engine = TrackingEngine::start(sim.platform(), catalog()).await.unwrap();
    engine.gate().open_system_settings();
    assert_eq!(sim.settings.open_count(), 1);
    engine.shutdown().await;
}
