//! Foreground location watcher.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{SamplingParams, TrackingConfig};
use crate::permission::PermissionGate;

use super::filter::{FilterDecision, TeleportFilter};
use super::sample::LocationSample;
use super::stream::{
    ErrorCallback, PositionError, PositionStreamService, PositionSubscription, SampleCallback,
};

/// Capacity of the accepted-sample broadcast channel.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Whether the watcher holds a live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatcherState {
    #[default]
    Stopped,
    Watching,
}

impl fmt::Display for WatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatcherState::Stopped => write!(f, "stopped"),
            WatcherState::Watching => write!(f, "watching"),
        }
    }
}

#[derive(Default)]
struct Live {
    state: WatcherState,
    latest: Option<LocationSample>,
    last_error: Option<PositionError>,
    rejected: u64,
}

/// Receives provider callbacks.
///
/// Each subscription is tagged with the generation current when it was
/// opened. Callbacks carrying an older generation are dropped, so a late
/// callback from a released subscription can never touch watcher state.
struct SampleSink {
    filter: TeleportFilter,
    generation: AtomicU64,
    live: Mutex<Live>,
    updates: broadcast::Sender<LocationSample>,
}

impl SampleSink {
    fn deliver(&self, generation: u64, sample: LocationSample) {
        let mut live = self.live.lock();
        if generation != self.generation.load(Ordering::SeqCst) {
            trace!(generation, "Dropping sample from released subscription");
            return;
        }

        match self.filter.evaluate(live.latest.as_ref(), &sample) {
            FilterDecision::Accept => {
                live.latest = Some(sample);
                live.last_error = None;
                drop(live);
                // No receivers is fine
                let _ = self.updates.send(sample);
            }
            FilterDecision::RejectTeleport {
                distance_meters,
                implied_speed_mps,
            } => {
                live.rejected += 1;
                debug!(
                    distance_m = distance_meters,
                    speed_mps = implied_speed_mps,
                    "Rejected teleport sample"
                );
            }
            FilterDecision::RejectStale { age_ms } => {
                live.rejected += 1;
                debug!(age_ms, "Rejected out-of-order sample");
            }
        }
    }

    fn fail(&self, generation: u64, error: PositionError) {
        let mut live = self.live.lock();
        if generation != self.generation.load(Ordering::SeqCst) {
            return;
        }
        warn!(error = %error, "Position stream error");
        live.last_error = Some(error);
    }

    /// Invalidate callbacks from every subscription opened so far.
    fn advance(&self) -> u64 {
        let _live = self.live.lock();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn set_state(&self, state: WatcherState) {
        self.live.lock().state = state;
    }
}

struct Active {
    subscription: Box<dyn PositionSubscription>,
    params: SamplingParams,
}

/// Owns the single foreground position subscription.
///
/// Start, stop and restart are serialized; at most one subscription is live at
/// any time. The latest accepted sample and the last provider error survive a
/// stop so the UI can keep showing them.
pub struct ForegroundLocationWatcher {
    stream: Arc<dyn PositionStreamService>,
    gate: Arc<PermissionGate>,
    config: Arc<TrackingConfig>,
    sink: Arc<SampleSink>,
    active: AsyncMutex<Option<Active>>,
}

impl ForegroundLocationWatcher {
    pub fn new(
        stream: Arc<dyn PositionStreamService>,
        gate: Arc<PermissionGate>,
        config: Arc<TrackingConfig>,
    ) -> Self {
        Self::with_filter(stream, gate, config, TeleportFilter::default())
    }

    pub fn with_filter(
        stream: Arc<dyn PositionStreamService>,
        gate: Arc<PermissionGate>,
        config: Arc<TrackingConfig>,
        filter: TeleportFilter,
    ) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            stream,
            gate,
            config,
            sink: Arc::new(SampleSink {
                filter,
                generation: AtomicU64::new(0),
                live: Mutex::new(Live::default()),
                updates,
            }),
            active: AsyncMutex::new(None),
        }
    }

    /// Open a subscription using the current sampling parameters.
    ///
    /// No-op when already watching, or when foreground permission is not
    /// granted (the returned state is then `Stopped`). Provider failures are
    /// recorded as [`last_error`](Self::last_error) and returned.
    pub async fn start(&self) -> Result<WatcherState, PositionError> {
        let mut active = self.active.lock().await;
        self.start_locked(&mut active).await
    }

    /// Release the subscription, if any. Never fails.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        self.stop_locked(&mut active).await;
    }

    /// Stop then start as one step.
    pub async fn restart(&self) -> Result<WatcherState, PositionError> {
        let mut active = self.active.lock().await;
        self.stop_locked(&mut active).await;
        self.start_locked(&mut active).await
    }

    /// Re-open the subscription if it is live with different parameters.
    pub async fn apply_sampling(
        &self,
        params: SamplingParams,
    ) -> Result<WatcherState, PositionError> {
        let mut active = self.active.lock().await;
        match active.as_ref() {
            Some(current) if current.params != params => {
                info!(
                    accuracy = %params.accuracy,
                    min_distance_m = params.min_distance_meters,
                    min_interval_ms = params.min_interval_ms,
                    "Sampling parameters changed, restarting position stream"
                );
                self.stop_locked(&mut active).await;
                self.start_locked(&mut active).await
            }
            Some(_) => Ok(WatcherState::Watching),
            None => Ok(WatcherState::Stopped),
        }
    }

    /// Restart the stream whenever the tracking configuration changes its
    /// sampling parameters, until `cancel` fires.
    pub fn spawn_config_follower(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let watcher = Arc::clone(self);
        let mut settings = self.config.subscribe();

        tokio::spawn(async move {
            let mut last = settings.borrow_and_update().sampling();
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    changed = settings.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let params = settings.borrow_and_update().sampling();
                        if params == last {
                            continue;
                        }
                        last = params;
                        if let Err(e) = watcher.apply_sampling(params).await {
                            warn!(error = %e, "Failed to restart position stream");
                        }
                    }
                }
            }
            debug!("Config follower stopped");
        })
    }

    pub fn state(&self) -> WatcherState {
        self.sink.live.lock().state
    }

    /// Latest sample that passed the teleport filter.
    pub fn latest_sample(&self) -> Option<LocationSample> {
        self.sink.live.lock().latest
    }

    pub fn last_error(&self) -> Option<PositionError> {
        self.sink.live.lock().last_error.clone()
    }

    /// Number of samples dropped by the filter since construction.
    pub fn rejected_count(&self) -> u64 {
        self.sink.live.lock().rejected
    }

    /// Stream of accepted samples.
    pub fn subscribe(&self) -> broadcast::Receiver<LocationSample> {
        self.sink.updates.subscribe()
    }

    async fn start_locked(
        &self,
        active: &mut Option<Active>,
    ) -> Result<WatcherState, PositionError> {
        if active.is_some() {
            return Ok(WatcherState::Watching);
        }

        let permission = self.gate.foreground_status().await;
        if !permission.is_granted() {
            debug!(permission = %permission, "Foreground permission not granted, not watching");
            return Ok(WatcherState::Stopped);
        }

        let params = self.config.snapshot().sampling();
        let generation = self.sink.advance();

        let sink = Arc::clone(&self.sink);
        let on_sample: SampleCallback = Arc::new(move |sample| sink.deliver(generation, sample));
        let sink = Arc::clone(&self.sink);
        let on_error: ErrorCallback = Arc::new(move |error| sink.fail(generation, error));

        match self.stream.watch(params, on_sample, on_error).await {
            Ok(subscription) => {
                *active = Some(Active {
                    subscription,
                    params,
                });
                self.sink.set_state(WatcherState::Watching);
                info!(
                    accuracy = %params.accuracy,
                    min_distance_m = params.min_distance_meters,
                    min_interval_ms = params.min_interval_ms,
                    "Position stream started"
                );
                Ok(WatcherState::Watching)
            }
            Err(e) => {
                warn!(error = %e, "Failed to open position stream");
                self.sink.live.lock().last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    async fn stop_locked(&self, active: &mut Option<Active>) {
        self.sink.advance();
        if let Some(current) = active.take() {
            current.subscription.cancel().await;
            self.sink.set_state(WatcherState::Stopped);
            info!("Position stream stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccuracyPreset, MemoryStore, TrackingSettings};
    use crate::permission::{PermissionResponse, PermissionScope};
    use crate::platform::sim::{
        SimulatedPermissions, SimulatedPositionStream, SimulatedSettingsLauncher,
    };
    use std::time::Duration;

    struct Harness {
        permissions: Arc<SimulatedPermissions>,
        stream: Arc<SimulatedPositionStream>,
        config: Arc<TrackingConfig>,
        watcher: Arc<ForegroundLocationWatcher>,
    }

    fn harness() -> Harness {
        let permissions = Arc::new(SimulatedPermissions::all_granted());
        let gate = Arc::new(PermissionGate::new(
            permissions.clone(),
            Arc::new(SimulatedSettingsLauncher::new()),
        ));
        let stream = Arc::new(SimulatedPositionStream::new());
        let config = Arc::new(TrackingConfig::with_settings(
            Arc::new(MemoryStore::new()),
            TrackingSettings::default(),
        ));
        let watcher = Arc::new(ForegroundLocationWatcher::new(
            stream.clone(),
            gate,
            config.clone(),
        ));
        Harness {
            permissions,
            stream,
            config,
            watcher,
        }
    }

    fn sample(t_ms: i64, lat: f64) -> LocationSample {
        LocationSample::new(lat, 33.0, 5.0, t_ms)
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let h = harness();
        assert_eq!(h.watcher.start().await.unwrap(), WatcherState::Watching);
        assert_eq!(h.watcher.start().await.unwrap(), WatcherState::Watching);

        assert_eq!(h.stream.watch_count(), 1);
        assert_eq!(h.stream.active_count(), 1);
        assert_eq!(h.watcher.state(), WatcherState::Watching);
    }

    #[tokio::test]
    async fn test_start_without_permission_is_noop() {
        let h = harness();
        h.permissions
            .set_status(PermissionScope::Foreground, PermissionResponse::denied());

        assert_eq!(h.watcher.start().await.unwrap(), WatcherState::Stopped);
        assert_eq!(h.stream.watch_count(), 0);
        // Never prompts on its own
        assert_eq!(h.permissions.prompt_count(PermissionScope::Foreground), 0);
    }

    #[tokio::test]
    async fn test_accepts_and_filters_samples() {
        let h = harness();
        h.watcher.start().await.unwrap();

        h.stream.emit(sample(0, 35.000));
        h.stream.emit(sample(500, 35.002)); // teleport
        assert_eq!(h.watcher.latest_sample(), Some(sample(0, 35.000)));
        assert_eq!(h.watcher.rejected_count(), 1);

        h.stream.emit(sample(5_000, 35.002));
        assert_eq!(h.watcher.latest_sample(), Some(sample(5_000, 35.002)));
    }

    #[tokio::test]
    async fn test_broadcasts_accepted_samples_only() {
        let h = harness();
        let mut rx = h.watcher.subscribe();
        h.watcher.start().await.unwrap();

        h.stream.emit(sample(0, 35.000));
        h.stream.emit(sample(500, 35.002));
        h.stream.emit(sample(6_000, 35.0001));

        assert_eq!(rx.recv().await.unwrap(), sample(0, 35.000));
        assert_eq!(rx.recv().await.unwrap(), sample(6_000, 35.0001));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stop_releases_and_keeps_last_sample() {
        let h = harness();
        h.watcher.start().await.unwrap();
        h.stream.emit(sample(0, 35.0));

        h.watcher.stop().await;
        h.watcher.stop().await;

        assert_eq!(h.stream.active_count(), 0);
        assert_eq!(h.watcher.state(), WatcherState::Stopped);
        assert_eq!(h.watcher.latest_sample(), Some(sample(0, 35.0)));
    }

    #[tokio::test]
    async fn test_late_callback_from_released_subscription_ignored() {
        let h = harness();
        h.watcher.start().await.unwrap();
        h.stream.emit(sample(0, 35.0));
        h.watcher.stop().await;

        // Provider delivers one more fix after cancellation
        h.stream.emit_late(0, sample(10_000, 35.1));
        assert_eq!(h.watcher.latest_sample(), Some(sample(0, 35.0)));

        // Also after a restart the old subscription stays muted
        h.watcher.start().await.unwrap();
        h.stream.emit_late(0, sample(20_000, 35.2));
        assert_eq!(h.watcher.latest_sample(), Some(sample(0, 35.0)));
    }

    #[tokio::test]
    async fn test_provider_error_recorded_then_cleared() {
        let h = harness();
        h.watcher.start().await.unwrap();

        h.stream
            .emit_error(PositionError::ProviderUnavailable("gps off".to_string()));
        assert!(matches!(
            h.watcher.last_error(),
            Some(PositionError::ProviderUnavailable(_))
        ));

        h.stream.emit(sample(0, 35.0));
        assert_eq!(h.watcher.last_error(), None);
    }

    #[tokio::test]
    async fn test_failed_watch_records_error() {
        let h = harness();
        h.stream
            .fail_next_watch(PositionError::ProviderUnavailable("insecure context".to_string()));

        assert!(h.watcher.start().await.is_err());
        assert_eq!(h.watcher.state(), WatcherState::Stopped);
        assert!(h.watcher.last_error().is_some());

        // A later start can still succeed
        assert_eq!(h.watcher.start().await.unwrap(), WatcherState::Watching);
    }

    #[tokio::test]
    async fn test_uses_configured_sampling() {
        let h = harness();
        h.config.set_min_distance(22.0).await.unwrap();
        h.watcher.start().await.unwrap();

        let options = h.stream.last_options().unwrap();
        assert_eq!(options.min_distance_meters, 22.0);
        assert_eq!(options.min_interval_ms, 6_000);
        assert_eq!(options.accuracy, AccuracyPreset::Balanced);
    }

    #[tokio::test]
    async fn test_apply_sampling_restarts_only_on_change() {
        let h = harness();
        h.watcher.start().await.unwrap();

        let same = h.config.snapshot().sampling();
        h.watcher.apply_sampling(same).await.unwrap();
        assert_eq!(h.stream.watch_count(), 1);

        h.config.set_accuracy_preset(AccuracyPreset::High).await.unwrap();
        let changed = h.config.snapshot().sampling();
        h.watcher.apply_sampling(changed).await.unwrap();
        assert_eq!(h.stream.watch_count(), 2);
        assert_eq!(h.stream.active_count(), 1);
        assert_eq!(h.stream.last_options().unwrap().accuracy, AccuracyPreset::High);
    }

    #[tokio::test]
    async fn test_apply_sampling_when_stopped_does_nothing() {
        let h = harness();
        let params = h.config.snapshot().sampling();
        assert_eq!(
            h.watcher.apply_sampling(params).await.unwrap(),
            WatcherState::Stopped
        );
        assert_eq!(h.stream.watch_count(), 0);
    }

    #[tokio::test]
    async fn test_config_follower_restarts_stream() {
        let h = harness();
        h.watcher.start().await.unwrap();
        let cancel = CancellationToken::new();
        let follower = h.watcher.spawn_config_follower(cancel.clone());

        h.config.set_min_interval(9_000).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            while h.stream.watch_count() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("stream was not restarted");

        assert_eq!(h.stream.active_count(), 1);
        assert_eq!(h.stream.last_options().unwrap().min_interval_ms, 9_000);

        cancel.cancel();
        follower.await.unwrap();
    }
}
