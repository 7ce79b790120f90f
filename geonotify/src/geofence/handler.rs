//! Background transition handler.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::platform::BoxFuture;
use crate::region::RegionCatalog;

use super::event::RegionTransition;
use super::notify::{LocalNotification, NotificationService};
use super::service::{BackgroundTaskError, BackgroundTaskHandler};

/// Turns OS region transitions into local notifications.
///
/// Runs inside an OS-owned execution context, so it never fails: delivery
/// errors and notification failures are logged and dropped, and a panic in
/// the notification backend is caught.
pub struct RegionTransitionHandler {
    catalog: Arc<RegionCatalog>,
    notifications: Arc<dyn NotificationService>,
}

impl RegionTransitionHandler {
    pub fn new(catalog: Arc<RegionCatalog>, notifications: Arc<dyn NotificationService>) -> Self {
        Self {
            catalog,
            notifications,
        }
    }

    async fn process(&self, transition: RegionTransition) {
        let event = transition.into_event();

        let name = match self.catalog.find_by_id(&event.region_id) {
            Ok(region) => region.name.as_str(),
            Err(_) => {
                warn!(region_id = %event.region_id, "Transition for unknown region, using raw id");
                event.region_id.as_str()
            }
        };

        let notification = LocalNotification::for_event(&event, name);
        match self.notifications.schedule(notification).await {
            Ok(()) => info!(
                region_id = %event.region_id,
                kind = %event.kind,
                "Region transition notified"
            ),
            Err(e) => warn!(
                region_id = %event.region_id,
                kind = %event.kind,
                error = %e,
                "Failed to schedule notification"
            ),
        }
    }
}

impl BackgroundTaskHandler for RegionTransitionHandler {
    fn handle(
        &self,
        delivery: Result<RegionTransition, BackgroundTaskError>,
    ) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let transition = match delivery {
                Ok(transition) => transition,
                Err(e) => {
                    warn!(error = %e, "Background task delivered an error");
                    return;
                }
            };

            let region_id = transition.region_id.clone();
            if AssertUnwindSafe(self.process(transition))
                .catch_unwind()
                .await
                .is_err()
            {
                error!(region_id = %region_id, "Transition handler panicked");
            }
        })
    }
}
