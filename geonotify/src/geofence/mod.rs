//! Background region monitoring.
//!
//! The OS owns geofence evaluation. This module registers the catalog's
//! regions under a named background task and turns each delivered
//! transition into a local notification.
//!
//! ```text
//!  RegionCatalog ──start()──► BackgroundRegionMonitor ──register──► GeofencingService
//!                                                                        │
//!                                                         OS transition  │
//!                                                                        ▼
//!  NotificationService ◄──schedule── RegionTransitionHandler ◄── BackgroundTaskRuntime
//! ```
//!
//! The handler is installed once, at process start, before any other work,
//! because the OS may launch the process only to deliver a transition.

mod event;
mod handler;
mod monitor;
mod notify;
mod service;

pub use event::{RegionEvent, RegionTransition, TransitionKind};
pub use handler::RegionTransitionHandler;
pub use monitor::{BackgroundRegionMonitor, MonitorError, REGION_MONITOR_TASK};
pub use notify::{LocalNotification, NotificationData, NotificationError, NotificationService};
pub use service::{
    BackgroundTaskError, BackgroundTaskHandler, BackgroundTaskRuntime, GeofenceError,
    GeofenceRegion, GeofencingService,
};
