//! Foreground live position.
//!
//! The [`ForegroundLocationWatcher`] owns at most one subscription to the
//! device position stream and keeps the latest *accepted* sample for on-screen
//! use. Raw samples pass through the [`TeleportFilter`], which drops GPS jumps
//! that imply an implausible speed within a one-second window.
//!
//! # State Machine
//!
//! ```text
//! Stopped --start() [foreground granted]--> Watching
//! Watching --stop()--> Stopped
//! Watching --sampling params changed--> stop() then start() --> Watching
//! ```
//!
//! # Example
//!
//! ```ignore
//! let watcher = Arc::new(ForegroundLocationWatcher::new(stream, gate, config));
//! let follower = watcher.spawn_config_follower(cancel.clone());
//!
//! watcher.start().await?;
//! let mut rx = watcher.subscribe();
//! while let Ok(sample) = rx.recv().await {
//!     println!("{:.5}, {:.5}", sample.latitude, sample.longitude);
//! }
//! ```

mod filter;
mod sample;
mod stream;
mod watcher;

pub use filter::{FilterDecision, TeleportFilter, TeleportFilterConfig};
pub use sample::LocationSample;
pub use stream::{
    ErrorCallback, PositionError, PositionStreamService, PositionSubscription, SampleCallback,
};
pub use watcher::{ForegroundLocationWatcher, WatcherState};
