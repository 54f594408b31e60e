//! Progress notification port
//!
//! Defines the interface for publishing lifecycle events of a run.

use chatloop_domain::ProgressEnvelope;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Sink for progress events.
///
/// Delivery is fire-and-forget: `emit` is synchronous and infallible, and
/// the loop never depends on an event arriving. Implementations may
/// broadcast, buffer, render or drop events.
pub trait ProgressNotifier: Send + Sync {
    fn emit(&self, envelope: &ProgressEnvelope);
}

/// Live feed of the events published on a channel.
///
/// Used by callers that queue a run and then follow it; subscribe before
/// dispatching, since events published earlier are not replayed.
pub trait ProgressSubscriber: Send + Sync {
    fn subscribe(&self, channel: &str) -> broadcast::Receiver<ProgressEnvelope>;
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn emit(&self, _envelope: &ProgressEnvelope) {}
}

impl<T: ProgressNotifier + ?Sized> ProgressNotifier for Arc<T> {
    fn emit(&self, envelope: &ProgressEnvelope) {
        (**self).emit(envelope);
    }
}
