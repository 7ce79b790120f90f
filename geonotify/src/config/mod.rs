//! Tracking configuration.
//!
//! [`TrackingConfig`] holds the user-facing tracking settings, validates and
//! clamps every write, and persists each field under its own key in a
//! [`KeyValueStore`] before the setter returns. Changes are published on a
//! watch channel so the foreground watcher and the lifecycle controller can
//! react without polling.
//!
//! # Persistence
//!
//! | Key                           | Encoding            | Default    |
//! |-------------------------------|---------------------|------------|
//! | `tracking.background_enabled` | `true` / `false`    | `false`    |
//! | `tracking.accuracy_preset`    | `balanced` / `high` | `balanced` |
//! | `tracking.min_distance_meters`| decimal, 10..=25    | `15`       |
//! | `tracking.min_interval_ms`    | integer, 5000..=10000 | `6000`   |
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(IniFileStore::open(config_file_path())?);
//! let config = TrackingConfig::load(store).await?;
//!
//! // Out-of-range values are clamped, never rejected
//! assert_eq!(config.set_min_distance(5.0).await?, 10.0);
//! ```

mod keys;
mod settings;
mod store;
mod tracking;

pub use keys::{ConfigKey, ConfigKeyError, ConfigValue};
pub use settings::{
    clamp_min_distance, clamp_min_interval, AccuracyPreset, SamplingParams, TrackingSettings,
    DEFAULT_MIN_DISTANCE_METERS, DEFAULT_MIN_INTERVAL_MS, MAX_MIN_DISTANCE_METERS,
    MAX_MIN_INTERVAL_MS, MIN_MIN_DISTANCE_METERS, MIN_MIN_INTERVAL_MS,
};
pub use store::{
    config_directory, config_file_path, IniFileStore, KeyValueStore, MemoryStore, StoreError,
};
pub use tracking::{ConfigError, TrackingConfig};
