//! Local notifications.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::BoxFuture;

use super::event::{RegionEvent, TransitionKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("Notifications unavailable: {0}")]
    Unavailable(String),

    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// Structured data attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub region_id: String,
    pub transition_kind: TransitionKind,
}

/// A notification to present immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
    pub data: NotificationData,
}

impl LocalNotification {
    /// Build the user-facing notification for a region transition.
    pub fn for_event(event: &RegionEvent, region_name: &str) -> Self {
        let (title, body) = match event.kind {
            TransitionKind::Enter => (
                format!("Entered {}", region_name),
                format!("You have entered {}.", region_name),
            ),
            TransitionKind::Exit => (
                format!("Left {}", region_name),
                format!("You have left {}.", region_name),
            ),
        };
        Self {
            title,
            body,
            data: NotificationData {
                region_id: event.region_id.clone(),
                transition_kind: event.kind,
            },
        }
    }
}

/// Presents local notifications.
pub trait NotificationService: Send + Sync {
    fn schedule(
        &self,
        notification: LocalNotification,
    ) -> BoxFuture<'_, Result<(), NotificationError>>;
}
