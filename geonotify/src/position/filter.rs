//! Teleport/jitter filter.
//!
//! A sample is rejected when, relative to the previously accepted sample, it
//! arrives within one second AND has moved more than 150 m AND the implied
//! speed exceeds 150 m/s. Genuinely fast motion (driving, trains) passes
//! because the rejection window is only one second wide.
//!
//! Samples captured before the previously accepted one are rejected as stale,
//! so the accepted position never moves backwards in time.

use crate::geo::great_circle_distance_meters;

use super::sample::LocationSample;

/// Thresholds for the teleport filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeleportFilterConfig {
    /// Only samples this close in time (seconds) are candidates for rejection.
    pub max_window_secs: f64,
    /// Displacement (metres) a candidate must exceed to be rejected.
    pub min_jump_meters: f64,
    /// Implied speed (m/s) a candidate must exceed to be rejected.
    pub max_speed_mps: f64,
}

impl Default for TeleportFilterConfig {
    fn default() -> Self {
        Self {
            max_window_secs: 1.0,
            min_jump_meters: 150.0,
            max_speed_mps: 150.0,
        }
    }
}

/// Outcome of filtering one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterDecision {
    Accept,
    /// Implausible jump; the previous sample stays current.
    RejectTeleport {
        distance_meters: f64,
        implied_speed_mps: f64,
    },
    /// Captured before the current sample.
    RejectStale { age_ms: i64 },
}

impl FilterDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FilterDecision::Accept)
    }
}

/// Stateless filter; the caller owns the previously accepted sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeleportFilter {
    config: TeleportFilterConfig,
}

impl TeleportFilter {
    pub fn new(config: TeleportFilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TeleportFilterConfig {
        &self.config
    }

    /// Decide whether `next` should replace `prev` as the latest sample.
    pub fn evaluate(&self, prev: Option<&LocationSample>, next: &LocationSample) -> FilterDecision {
        let Some(prev) = prev else {
            return FilterDecision::Accept;
        };

        // Overflow means the gap is far outside the teleport window either way
        let dt_ms = match next
            .captured_at_epoch_ms
            .checked_sub(prev.captured_at_epoch_ms)
        {
            Some(dt_ms) => dt_ms,
            None if next.captured_at_epoch_ms > prev.captured_at_epoch_ms => {
                return FilterDecision::Accept;
            }
            None => return FilterDecision::RejectStale { age_ms: i64::MAX },
        };
        if dt_ms < 0 {
            return FilterDecision::RejectStale {
                age_ms: dt_ms.saturating_neg(),
            };
        }

        let dt = dt_ms as f64 / 1000.0;
        let d = great_circle_distance_meters(prev.point(), next.point());

        if dt > 0.0
            && dt <= self.config.max_window_secs
            && d > self.config.min_jump_meters
            && d / dt > self.config.max_speed_mps
        {
            return FilterDecision::RejectTeleport {
                distance_meters: d,
                implied_speed_mps: d / dt,
            };
        }

        FilterDecision::Accept
    }
}
