//! Background tracking lifecycle.
//!
//! Binds the persisted background-tracking flag to the region monitor:
//!
//! ```text
//! flag true  ──► ensure foreground ──► ensure background ──► monitor.start()
//!                      │ denied              │ denied              │ failed
//!                      └──────────► revert flag to false ◄─────────┘
//! flag false ──► monitor.stop()
//! ```

mod controller;

pub use controller::{LifecycleError, LifecycleReport, TrackingLifecycleController};
