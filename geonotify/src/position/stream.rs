//! Device position stream interface.

use std::sync::Arc;

use thiserror::Error;

use crate::config::SamplingParams;
use crate::platform::BoxFuture;

use super::sample::LocationSample;

/// Failures reported by the position provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    /// Location services disabled, hardware missing, or insecure context.
    #[error("Location provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider refused because foreground permission is missing.
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location provider error: {0}")]
    Provider(String),
}

/// Invoked for every raw sample, in delivery order.
pub type SampleCallback = Arc<dyn Fn(LocationSample) + Send + Sync>;

/// Invoked when the provider reports a failure on a live subscription.
pub type ErrorCallback = Arc<dyn Fn(PositionError) + Send + Sync>;

/// Handle to a live position subscription.
pub trait PositionSubscription: Send + Sync {
    /// Release the subscription. Resolves once the provider has stopped it.
    fn cancel(&self) -> BoxFuture<'_, ()>;
}

/// Device position stream.
pub trait PositionStreamService: Send + Sync {
    /// Open a subscription with fixed parameters.
    ///
    /// Parameters of a live subscription are never changed; callers cancel
    /// and re-open instead.
    fn watch(
        &self,
        options: SamplingParams,
        on_sample: SampleCallback,
        on_error: ErrorCallback,
    ) -> BoxFuture<'_, Result<Box<dyn PositionSubscription>, PositionError>>;
}
