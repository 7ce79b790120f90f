//! Simulated geofencing and background task runtime.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::geo::GeoPoint;
use crate::geofence::{
    BackgroundTaskError, BackgroundTaskHandler, BackgroundTaskRuntime, GeofenceError,
    GeofenceRegion, GeofencingService, RegionTransition, TransitionKind,
};
use crate::platform::BoxFuture;

/// Task registry that invokes handlers on demand.
#[derive(Default)]
pub struct SimulatedTaskRuntime {
    handlers: DashMap<String, Arc<dyn BackgroundTaskHandler>>,
}

impl SimulatedTaskRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_defined(&self, task_name: &str) -> bool {
        self.handlers.contains_key(task_name)
    }

    pub fn task_count(&self) -> usize {
        self.handlers.len()
    }

    /// Invoke the handler for `task_name` as the OS would.
    ///
    /// Returns `false` if no handler is defined.
    pub async fn dispatch(
        &self,
        task_name: &str,
        delivery: Result<RegionTransition, BackgroundTaskError>,
    ) -> bool {
        let handler = self.handlers.get(task_name).map(|h| Arc::clone(h.value()));
        match handler {
            Some(handler) => {
                handler.handle(delivery).await;
                true
            }
            None => {
                warn!(task = task_name, "No handler defined for background task");
                false
            }
        }
    }
}

impl BackgroundTaskRuntime for SimulatedTaskRuntime {
    fn define_task(&self, task_name: &str, handler: Arc<dyn BackgroundTaskHandler>) {
        if self
            .handlers
            .insert(task_name.to_string(), handler)
            .is_some()
        {
            warn!(task = task_name, "Background task redefined");
        }
    }
}

/// OS geofencing that evaluates boundaries against positions fed by the
/// caller.
///
/// Registering the same task twice without unregistering keeps both
/// registrations, and each one delivers its own transitions.
pub struct SimulatedGeofencing {
    runtime: Arc<SimulatedTaskRuntime>,
    registrations: DashMap<String, Vec<Vec<GeofenceRegion>>>,
    inside: Mutex<HashSet<(String, String)>>,
    failure: Mutex<Option<GeofenceError>>,
}

struct Delivery {
    task: String,
    transition: RegionTransition,
    copies: usize,
}

impl SimulatedGeofencing {
    pub fn new(runtime: Arc<SimulatedTaskRuntime>) -> Self {
        Self {
            runtime,
            registrations: DashMap::new(),
            inside: Mutex::new(HashSet::new()),
            failure: Mutex::new(None),
        }
    }

    /// Fail every subsequent call with `error`, or succeed again with `None`.
    pub fn fail_with(&self, error: Option<GeofenceError>) {
        *self.failure.lock() = error;
    }

    pub fn registration_count(&self, task_name: &str) -> usize {
        self.registrations
            .get(task_name)
            .map(|sets| sets.len())
            .unwrap_or(0)
    }

    /// Regions of the most recent registration under `task_name`.
    pub fn registered_regions(&self, task_name: &str) -> Vec<GeofenceRegion> {
        self.registrations
            .get(task_name)
            .and_then(|sets| sets.last().cloned())
            .unwrap_or_default()
    }

    /// Move the device to `point` and deliver any boundary crossings.
    ///
    /// Returns the transitions delivered, one entry per delivery.
    pub async fn update_position(&self, point: GeoPoint) -> Vec<RegionTransition> {
        let deliveries = self.crossings(point);
        let mut delivered = Vec::new();
        for delivery in deliveries {
            for _ in 0..delivery.copies {
                if self
                    .runtime
                    .dispatch(&delivery.task, Ok(delivery.transition.clone()))
                    .await
                {
                    delivered.push(delivery.transition.clone());
                }
            }
        }
        delivered
    }

    /// Deliver a transition for `region_id` to every registration that
    /// contains it, regardless of position. Returns the delivery count.
    pub async fn trigger(&self, region_id: &str, kind: TransitionKind) -> usize {
        let targets: Vec<(String, usize)> = self
            .registrations
            .iter()
            .map(|entry| {
                let copies = entry
                    .value()
                    .iter()
                    .filter(|set| set.iter().any(|f| f.id == region_id))
                    .count();
                (entry.key().clone(), copies)
            })
            .filter(|(_, copies)| *copies > 0)
            .collect();

        let mut count = 0;
        for (task, copies) in targets {
            for _ in 0..copies {
                let transition = RegionTransition::new(region_id, kind);
                if self.runtime.dispatch(&task, Ok(transition)).await {
                    count += 1;
                }
            }
        }
        count
    }

    /// Deliver an OS-side failure to the task.
    pub async fn deliver_error(&self, task_name: &str, error: BackgroundTaskError) -> bool {
        self.runtime.dispatch(task_name, Err(error)).await
    }

    fn crossings(&self, point: GeoPoint) -> Vec<Delivery> {
        let mut inside = self.inside.lock();
        let mut deliveries = Vec::new();

        for entry in self.registrations.iter() {
            let task = entry.key();
            // Distinct fences in registration order, with how many sets hold each
            let mut fences: Vec<(&GeofenceRegion, usize)> = Vec::new();
            for fence in entry.value().iter().flatten() {
                match fences.iter_mut().find(|(f, _)| f.id == fence.id) {
                    Some((_, copies)) => *copies += 1,
                    None => fences.push((fence, 1)),
                }
            }

            for (fence, copies) in fences {
                let key = (task.clone(), fence.id.clone());
                let center = GeoPoint::new(fence.latitude, fence.longitude);
                let now_inside = center.distance_to(&point) <= fence.radius_meters;
                let was_inside = inside.contains(&key);

                let kind = match (was_inside, now_inside) {
                    (false, true) => {
                        inside.insert(key);
                        TransitionKind::Enter
                    }
                    (true, false) => {
                        inside.remove(&key);
                        TransitionKind::Exit
                    }
                    _ => continue,
                };

                let wanted = match kind {
                    TransitionKind::Enter => fence.notify_on_enter,
                    TransitionKind::Exit => fence.notify_on_exit,
                };
                if wanted {
                    debug!(task = %task, region_id = %fence.id, kind = %kind, "Boundary crossed");
                    deliveries.push(Delivery {
                        task: task.clone(),
                        transition: RegionTransition::new(fence.id.clone(), kind),
                        copies,
                    });
                }
            }
        }
        deliveries
    }

    fn check(&self) -> Result<(), GeofenceError> {
        match self.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl GeofencingService for SimulatedGeofencing {
    fn is_registered(&self, task_name: &str) -> BoxFuture<'_, Result<bool, GeofenceError>> {
        let task_name = task_name.to_string();
        Box::pin(async move {
            self.check()?;
            Ok(self.registration_count(&task_name) > 0)
        })
    }

    fn register(
        &self,
        task_name: &str,
        regions: Vec<GeofenceRegion>,
    ) -> BoxFuture<'_, Result<(), GeofenceError>> {
        let task_name = task_name.to_string();
        Box::pin(async move {
            self.check()?;
            self.registrations.entry(task_name).or_default().push(regions);
            Ok(())
        })
    }

    fn unregister(&self, task_name: &str) -> BoxFuture<'_, Result<(), GeofenceError>> {
        let task_name = task_name.to_string();
        Box::pin(async move {
            self.check()?;
            self.registrations.remove(&task_name);
            self.inside.lock().retain(|(task, _)| task != &task_name);
            Ok(())
        })
    }
}
