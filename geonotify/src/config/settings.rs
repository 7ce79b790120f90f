//! Tracking settings value type and validation rules.

use std::fmt;
use std::str::FromStr;

/// Lower bound for the minimum distance between foreground samples.
pub const MIN_MIN_DISTANCE_METERS: f64 = 10.0;
/// Upper bound for the minimum distance between foreground samples.
pub const MAX_MIN_DISTANCE_METERS: f64 = 25.0;
/// Default minimum distance between foreground samples.
pub const DEFAULT_MIN_DISTANCE_METERS: f64 = 15.0;

/// Lower bound for the minimum interval between foreground samples.
pub const MIN_MIN_INTERVAL_MS: u64 = 5_000;
/// Upper bound for the minimum interval between foreground samples.
pub const MAX_MIN_INTERVAL_MS: u64 = 10_000;
/// Default minimum interval between foreground samples.
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 6_000;

/// Clamp a minimum distance into its valid range.
///
/// NaN maps to the lower bound.
pub fn clamp_min_distance(meters: f64) -> f64 {
    if meters.is_nan() {
        return MIN_MIN_DISTANCE_METERS;
    }
    meters.clamp(MIN_MIN_DISTANCE_METERS, MAX_MIN_DISTANCE_METERS)
}

/// Clamp a minimum interval into its valid range.
///
/// Takes a signed value so negative user input clamps rather than wraps.
pub fn clamp_min_interval(ms: i64) -> u64 {
    ms.clamp(MIN_MIN_INTERVAL_MS as i64, MAX_MIN_INTERVAL_MS as i64) as u64
}

/// Position provider quality/power trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccuracyPreset {
    /// Network/Wi-Fi assisted, battery friendly.
    #[default]
    Balanced,
    /// GPS, best precision.
    High,
}

impl AccuracyPreset {
    /// Persistence/CLI name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccuracyPreset::Balanced => "balanced",
            AccuracyPreset::High => "high",
        }
    }
}

impl fmt::Display for AccuracyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccuracyPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "balanced" => Ok(AccuracyPreset::Balanced),
            "high" => Ok(AccuracyPreset::High),
            other => Err(format!(
                "unknown accuracy preset '{}' (expected balanced or high)",
                other
            )),
        }
    }
}

/// The parameters a position subscription is opened with.
///
/// Any change to these requires the foreground watcher to re-subscribe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub accuracy: AccuracyPreset,
    pub min_distance_meters: f64,
    pub min_interval_ms: u64,
}

/// Snapshot of all tracking settings.
///
/// Constructed values are always within range; use the clamping helpers when
/// building from untrusted input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingSettings {
    pub background_tracking_enabled: bool,
    pub accuracy_preset: AccuracyPreset,
    pub min_distance_meters: f64,
    pub min_interval_ms: u64,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            background_tracking_enabled: false,
            accuracy_preset: AccuracyPreset::Balanced,
            min_distance_meters: DEFAULT_MIN_DISTANCE_METERS,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
        }
    }
}

impl TrackingSettings {
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            accuracy: self.accuracy_preset,
            min_distance_meters: self.min_distance_meters,
            min_interval_ms: self.min_interval_ms,
        }
    }
}
