//! Simulated position provider.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::config::SamplingParams;
use crate::platform::BoxFuture;
use crate::position::{
    ErrorCallback, LocationSample, PositionError, PositionStreamService, PositionSubscription,
    SampleCallback,
};

struct Watch {
    options: SamplingParams,
    on_sample: SampleCallback,
    on_error: ErrorCallback,
    active: Arc<AtomicBool>,
}

struct SimSubscription {
    active: Arc<AtomicBool>,
}

impl PositionSubscription for SimSubscription {
    fn cancel(&self) -> BoxFuture<'_, ()> {
        self.active.store(false, Ordering::SeqCst);
        Box::pin(async {})
    }
}

/// Position stream fed by the caller.
///
/// Every `watch` call is kept in history, including cancelled ones, so tests
/// can model a provider that delivers after cancellation.
#[derive(Default)]
pub struct SimulatedPositionStream {
    watches: Mutex<Vec<Watch>>,
    fail_next: Mutex<Option<PositionError>>,
}

impl SimulatedPositionStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `watch` call fail with `error`.
    pub fn fail_next_watch(&self, error: PositionError) {
        *self.fail_next.lock() = Some(error);
    }

    /// Deliver a fix to every live subscription.
    pub fn emit(&self, sample: LocationSample) {
        for callback in self.live_callbacks(|w| Arc::clone(&w.on_sample)) {
            callback(sample);
        }
    }

    /// Deliver a provider error to every live subscription.
    pub fn emit_error(&self, error: PositionError) {
        for callback in self.live_callbacks(|w| Arc::clone(&w.on_error)) {
            callback(error.clone());
        }
    }

    /// Deliver a fix through the `index`-th subscription ever opened, live or
    /// not.
    pub fn emit_late(&self, index: usize, sample: LocationSample) {
        let callback = self
            .watches
            .lock()
            .get(index)
            .map(|w| Arc::clone(&w.on_sample));
        if let Some(callback) = callback {
            trace!(index, "Delivering late sample");
            callback(sample);
        }
    }

    /// Number of `watch` calls that opened a subscription.
    pub fn watch_count(&self) -> usize {
        self.watches.lock().len()
    }

    pub fn active_count(&self) -> usize {
        self.watches
            .lock()
            .iter()
            .filter(|w| w.active.load(Ordering::SeqCst))
            .count()
    }

    /// Options of the most recent subscription.
    pub fn last_options(&self) -> Option<SamplingParams> {
        self.watches.lock().last().map(|w| w.options)
    }

    // Callbacks are collected first so none runs under the lock.
    fn live_callbacks<T>(&self, pick: impl Fn(&Watch) -> T) -> Vec<T> {
        self.watches
            .lock()
            .iter()
            .filter(|w| w.active.load(Ordering::SeqCst))
            .map(pick)
            .collect()
    }
}

impl PositionStreamService for SimulatedPositionStream {
    fn watch(
        &self,
        options: SamplingParams,
        on_sample: SampleCallback,
        on_error: ErrorCallback,
    ) -> BoxFuture<'_, Result<Box<dyn PositionSubscription>, PositionError>> {
        Box::pin(async move {
            if let Some(error) = self.fail_next.lock().take() {
                return Err(error);
            }

            let active = Arc::new(AtomicBool::new(true));
            self.watches.lock().push(Watch {
                options,
                on_sample,
                on_error,
                active: Arc::clone(&active),
            });
            Ok(Box::new(SimSubscription { active }) as Box<dyn PositionSubscription>)
        })
    }
}
