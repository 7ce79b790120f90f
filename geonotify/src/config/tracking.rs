//! Persisted, validated tracking configuration with change notification.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::keys::{ConfigKey, ConfigKeyError};
use super::settings::{
    clamp_min_distance, clamp_min_interval, AccuracyPreset, TrackingSettings,
};
use super::store::{KeyValueStore, StoreError};

/// Errors from loading or updating the tracking configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {key}: {source}")]
    Load {
        key: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Failed to persist {key}: {source}")]
    Persist {
        key: &'static str,
        #[source]
        source: StoreError,
    },
}

/// Tracking configuration shared by the watchers and the lifecycle controller.
///
/// Setters are serialized: at most one write is in flight, and the in-memory
/// value only changes after the store has accepted it. Readers get a
/// consistent [`TrackingSettings`] snapshot at any time.
pub struct TrackingConfig {
    store: Arc<dyn KeyValueStore>,
    state: watch::Sender<TrackingSettings>,
    write_lock: Mutex<()>,
}

impl TrackingConfig {
    /// Load settings from the store, applying defaults for absent keys.
    ///
    /// Unparsable values fall back to their default with a warning;
    /// out-of-range numbers are clamped.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, ConfigError> {
        let mut settings = TrackingSettings::default();

        for key in ConfigKey::all() {
            let raw = store
                .get(key.name())
                .await
                .map_err(|source| ConfigError::Load {
                    key: key.name(),
                    source,
                })?;

            if let Some(raw) = raw {
                if let Err(e) = key.apply(&mut settings, &raw) {
                    warn!(
                        key = key.name(),
                        value = %raw,
                        error = %e,
                        "Ignoring invalid stored setting"
                    );
                }
            }
        }

        info!(
            background_tracking = settings.background_tracking_enabled,
            accuracy = %settings.accuracy_preset,
            min_distance_m = settings.min_distance_meters,
            min_interval_ms = settings.min_interval_ms,
            "Tracking configuration loaded"
        );

        Ok(Self::with_settings(store, settings))
    }

    /// Create a config with explicit initial settings (nothing is read).
    pub fn with_settings(store: Arc<dyn KeyValueStore>, settings: TrackingSettings) -> Self {
        let (state, _) = watch::channel(settings);
        Self {
            store,
            state,
            write_lock: Mutex::new(()),
        }
    }

    /// Current settings snapshot.
    pub fn snapshot(&self) -> TrackingSettings {
        *self.state.borrow()
    }

    /// Subscribe to settings changes.
    ///
    /// The receiver sees the current value immediately and is notified after
    /// every successful, persisted mutation.
    pub fn subscribe(&self) -> watch::Receiver<TrackingSettings> {
        self.state.subscribe()
    }

    pub fn background_tracking_enabled(&self) -> bool {
        self.state.borrow().background_tracking_enabled
    }

    pub fn accuracy_preset(&self) -> AccuracyPreset {
        self.state.borrow().accuracy_preset
    }

    pub fn min_distance_meters(&self) -> f64 {
        self.state.borrow().min_distance_meters
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.state.borrow().min_interval_ms
    }

    pub async fn set_background_tracking(&self, enabled: bool) -> Result<(), ConfigError> {
        self.update(ConfigKey::BackgroundEnabled, |s| {
            s.background_tracking_enabled = enabled
        })
        .await
        .map(|_| ())
    }

    pub async fn set_accuracy_preset(&self, preset: AccuracyPreset) -> Result<(), ConfigError> {
        self.update(ConfigKey::AccuracyPreset, |s| s.accuracy_preset = preset)
            .await
            .map(|_| ())
    }

    /// Set the minimum distance, clamped to 10..=25 m. Returns the stored value.
    pub async fn set_min_distance(&self, meters: f64) -> Result<f64, ConfigError> {
        let clamped = clamp_min_distance(meters);
        self.update(ConfigKey::MinDistanceMeters, |s| {
            s.min_distance_meters = clamped
        })
        .await
        .map(|s| s.min_distance_meters)
    }

    /// Set the minimum interval, clamped to 5000..=10000 ms. Returns the
    /// stored value.
    pub async fn set_min_interval(&self, ms: i64) -> Result<u64, ConfigError> {
        let clamped = clamp_min_interval(ms);
        self.update(ConfigKey::MinIntervalMs, |s| s.min_interval_ms = clamped)
            .await
            .map(|s| s.min_interval_ms)
    }

    /// Set a field by its persistence key from a raw string (CLI entry point).
    pub async fn set_raw(&self, key: ConfigKey, raw: &str) -> Result<(), ConfigKeyError> {
        let value = key.parse(raw)?;
        self.update(key, |s| value.apply_to(s))
            .await
            .map(|_| ())
            .map_err(|e| ConfigKeyError::Persist(e.to_string()))
    }

    async fn update<F>(&self, key: ConfigKey, mutate: F) -> Result<TrackingSettings, ConfigError>
    where
        F: FnOnce(&mut TrackingSettings),
    {
        let _guard = self.write_lock.lock().await;

        let mut next = self.snapshot();
        mutate(&mut next);

        self.store
            .set(key.name(), key.get(&next))
            .await
            .map_err(|source| ConfigError::Persist {
                key: key.name(),
                source,
            })?;

        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        debug!(key = key.name(), value = %key.get(&next), "Tracking setting updated");

        Ok(next)
    }
}
