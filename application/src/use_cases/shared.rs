//! Shared utilities for use cases.
//!
//! Contains cancellation checking and the channel-bound event emitter used
//! by the orchestration loop and the chat service.

use chatloop_domain::{FailureReason, ProgressEnvelope, ProgressEvent};
use tokio_util::sync::CancellationToken;

use crate::ports::clock::Clock;
use crate::ports::progress::ProgressNotifier;

/// Check if cancellation has been requested.
///
/// Returns `Err(FailureReason::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), FailureReason> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(FailureReason::Cancelled);
    }
    Ok(())
}

/// Stamps events with the channel and the current time before handing them
/// to a [`ProgressNotifier`].
pub(crate) struct ChannelEmitter<'a> {
    progress: &'a dyn ProgressNotifier,
    clock: &'a dyn Clock,
    channel: String,
}

impl<'a> ChannelEmitter<'a> {
    pub(crate) fn new(progress: &'a dyn ProgressNotifier, clock: &'a dyn Clock, channel: String) -> Self {
        Self {
            progress,
            clock,
            channel,
        }
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        let envelope = ProgressEnvelope::new(self.channel.clone(), event, self.clock.now());
        self.progress.emit(&envelope);
    }
}
