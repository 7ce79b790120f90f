//! Engine bootstrap and lifecycle management.
//!
//! # Startup Order
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          TrackingEngine                          │
//! │                                                                  │
//! │  1. BackgroundTaskRuntime::define_task(RegionTransitionHandler)  │
//! │  2. TrackingConfig::load(store)                                  │
//! │  3. PermissionGate, ForegroundLocationWatcher,                   │
//! │     BackgroundRegionMonitor, TrackingLifecycleController         │
//! │  4. ForegroundLocationWatcher::start (no-op without permission)  │
//! │  5. spawn controller loop, watcher config follower and           │
//! │     foreground follower                                          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

mod bootstrap;
mod error;

pub use bootstrap::TrackingEngine;
pub use error::AppError;
