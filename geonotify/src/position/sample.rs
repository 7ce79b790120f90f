//! Device position samples.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// One fix from the device location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in metres.
    pub accuracy_meters: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_degrees: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
    /// Capture time, Unix epoch milliseconds.
    pub captured_at_epoch_ms: i64,
}

impl LocationSample {
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
        captured_at_epoch_ms: i64,
    ) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
            heading_degrees: None,
            speed_mps: None,
            captured_at_epoch_ms,
        }
    }

    /// A sample captured now.
    pub fn now(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self::new(
            latitude,
            longitude,
            accuracy_meters,
            chrono::Utc::now().timestamp_millis(),
        )
    }

    pub fn with_heading(mut self, heading_degrees: f64) -> Self {
        self.heading_degrees = Some(heading_degrees);
        self
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}
