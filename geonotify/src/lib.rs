//! GeoNotify - region notifications and live location
//!
//! A region-monitoring and live-location engine. Background monitoring
//! registers a fixed catalog of circular regions with the OS and raises a
//! local notification on every enter/exit transition. Foreground tracking
//! keeps a filtered live position for on-screen use. Both are driven by a
//! persisted tracking configuration and gated on location permission.
//!
//! The host OS is reached only through the traits in [`platform`];
//! [`platform::sim`] implements them in-process.

pub mod app;
pub mod config;
pub mod geo;
pub mod geofence;
pub mod lifecycle;
pub mod logging;
pub mod permission;
pub mod platform;
pub mod position;
pub mod region;
pub mod status;

pub use app::{AppError, TrackingEngine};
