//! Recording notification backend.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::geofence::{LocalNotification, NotificationError, NotificationService};
use crate::platform::BoxFuture;

/// Keeps every scheduled notification in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<LocalNotification>>,
    failure: Mutex<Option<NotificationError>>,
    attempts: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every subsequent `schedule` with `error`, or succeed again with
    /// `None`.
    pub fn fail_with(&self, error: Option<NotificationError>) {
        *self.failure.lock() = error;
    }

    /// Notifications scheduled successfully, oldest first.
    pub fn notifications(&self) -> Vec<LocalNotification> {
        self.sent.lock().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl NotificationService for RecordingNotifier {
    fn schedule(
        &self,
        notification: LocalNotification,
    ) -> BoxFuture<'_, Result<(), NotificationError>> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = self.failure.lock().clone() {
                return Err(error);
            }
            self.sent.lock().push(notification);
            Ok(())
        })
    }
}
