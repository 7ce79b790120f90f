//! Configuration key access and validation.
//!
//! Each [`ConfigKey`] maps to one field of [`TrackingSettings`] and to one
//! persistence key. It knows how to encode the field as a string and how to
//! parse and clamp a raw string back into the field.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::settings::{clamp_min_distance, clamp_min_interval, AccuracyPreset, TrackingSettings};

/// Errors when getting or setting configuration values by key.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save setting: {0}")]
    Persist(String),
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    BackgroundEnabled,
    AccuracyPreset,
    MinDistanceMeters,
    MinIntervalMs,
}

/// A parsed (and clamped) value for one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigValue {
    BackgroundEnabled(bool),
    AccuracyPreset(AccuracyPreset),
    MinDistanceMeters(f64),
    MinIntervalMs(u64),
}

impl ConfigValue {
    pub fn apply_to(self, settings: &mut TrackingSettings) {
        match self {
            ConfigValue::BackgroundEnabled(v) => settings.background_tracking_enabled = v,
            ConfigValue::AccuracyPreset(v) => settings.accuracy_preset = v,
            ConfigValue::MinDistanceMeters(v) => settings.min_distance_meters = v,
            ConfigValue::MinIntervalMs(v) => settings.min_interval_ms = v,
        }
    }
}

impl ConfigKey {
    /// All keys, in display order.
    pub fn all() -> [ConfigKey; 4] {
        [
            ConfigKey::BackgroundEnabled,
            ConfigKey::AccuracyPreset,
            ConfigKey::MinDistanceMeters,
            ConfigKey::MinIntervalMs,
        ]
    }

    /// Persistence key name (`section.key`).
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::BackgroundEnabled => "tracking.background_enabled",
            ConfigKey::AccuracyPreset => "tracking.accuracy_preset",
            ConfigKey::MinDistanceMeters => "tracking.min_distance_meters",
            ConfigKey::MinIntervalMs => "tracking.min_interval_ms",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConfigKey::BackgroundEnabled => "Monitor points of interest while in background",
            ConfigKey::AccuracyPreset => "Position accuracy preset (balanced, high)",
            ConfigKey::MinDistanceMeters => "Minimum metres between live samples (10-25)",
            ConfigKey::MinIntervalMs => "Minimum milliseconds between live samples (5000-10000)",
        }
    }

    /// Encode the field for this key.
    pub fn get(&self, settings: &TrackingSettings) -> String {
        match self {
            ConfigKey::BackgroundEnabled => settings.background_tracking_enabled.to_string(),
            ConfigKey::AccuracyPreset => settings.accuracy_preset.to_string(),
            ConfigKey::MinDistanceMeters => settings.min_distance_meters.to_string(),
            ConfigKey::MinIntervalMs => settings.min_interval_ms.to_string(),
        }
    }

    /// Parse a raw string for this key, clamping numbers into range.
    pub fn parse(&self, raw: &str) -> Result<ConfigValue, ConfigKeyError> {
        let raw = raw.trim();
        let invalid = |reason: String| ConfigKeyError::InvalidValue {
            key: self.name().to_string(),
            reason,
        };

        match self {
            ConfigKey::BackgroundEnabled => match raw.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(ConfigValue::BackgroundEnabled(true)),
                "false" | "0" | "no" | "off" => Ok(ConfigValue::BackgroundEnabled(false)),
                _ => Err(invalid(format!("'{}' is not a boolean", raw))),
            },
            ConfigKey::AccuracyPreset => raw
                .parse::<AccuracyPreset>()
                .map(ConfigValue::AccuracyPreset)
                .map_err(invalid),
            ConfigKey::MinDistanceMeters => raw
                .parse::<f64>()
                .map(|v| ConfigValue::MinDistanceMeters(clamp_min_distance(v)))
                .map_err(|_| invalid(format!("'{}' is not a number", raw))),
            ConfigKey::MinIntervalMs => raw
                .parse::<i64>()
                .map(|v| ConfigValue::MinIntervalMs(clamp_min_interval(v)))
                .map_err(|_| invalid(format!("'{}' is not an integer", raw))),
        }
    }

    /// Parse `raw` and store it into `settings`.
    pub fn apply(&self, settings: &mut TrackingSettings, raw: &str) -> Result<(), ConfigKeyError> {
        self.parse(raw)?.apply_to(settings);
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConfigKey::all()
            .into_iter()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_names() {
        assert_eq!(
            "tracking.min_interval_ms".parse::<ConfigKey>().unwrap(),
            ConfigKey::MinIntervalMs
        );
        assert_eq!(
            "Tracking.Background_Enabled".parse::<ConfigKey>().unwrap(),
            ConfigKey::BackgroundEnabled
        );
        assert!(matches!(
            "tracking.speed".parse::<ConfigKey>(),
            Err(ConfigKeyError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_display_matches_name() {
        for key in ConfigKey::all() {
            assert_eq!(key.to_string(), key.name());
        }
    }

    #[test]
    fn test_parse_boolean_forms() {
        let key = ConfigKey::BackgroundEnabled;
        assert_eq!(key.parse("yes").unwrap(), ConfigValue::BackgroundEnabled(true));
        assert_eq!(key.parse("OFF").unwrap(), ConfigValue::BackgroundEnabled(false));
        assert!(key.parse("maybe").is_err());
    }

    #[test]
    fn test_parse_clamps_numbers() {
        assert_eq!(
            ConfigKey::MinDistanceMeters.parse("100").unwrap(),
            ConfigValue::MinDistanceMeters(25.0)
        );
        assert_eq!(
            ConfigKey::MinIntervalMs.parse("-20").unwrap(),
            ConfigValue::MinIntervalMs(5000)
        );
        assert!(ConfigKey::MinIntervalMs.parse("6.5").is_err());
    }

    #[test]
    fn test_get_apply_round_trip() {
        let source = TrackingSettings {
            background_tracking_enabled: true,
            accuracy_preset: AccuracyPreset::High,
            min_distance_meters: 12.5,
            min_interval_ms: 9000,
        };
        let mut target = TrackingSettings::default();
        for key in ConfigKey::all() {
            key.apply(&mut target, &key.get(&source)).unwrap();
        }
        assert_eq!(source, target);
    }
}
