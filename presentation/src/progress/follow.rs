//! Following a queued run through its progress events.

use chatloop_application::ProgressNotifier;
use chatloop_domain::ProgressEnvelope;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::{Receiver, error::RecvError};

#[derive(Error, Debug, PartialEq)]
pub enum FollowError {
    #[error("No result after {0:?}")]
    TimedOut(Duration),

    #[error("Event stream closed before the run finished")]
    Closed,
}

/// Forward events to `progress` until the run's terminal event arrives.
///
/// A lagging receiver skips what it missed and keeps going.
pub async fn follow_run(
    rx: &mut Receiver<ProgressEnvelope>,
    progress: &dyn ProgressNotifier,
    timeout: Duration,
) -> Result<ProgressEnvelope, FollowError> {
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    progress.emit(&envelope);
                    if envelope.kind().is_terminal() {
                        return Ok(envelope);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Progress receiver lagged, events skipped");
                }
                Err(RecvError::Closed) => return Err(FollowError::Closed),
            }
        }
    };

    tokio::time::timeout(timeout, wait)
        .await
        .unwrap_or(Err(FollowError::TimedOut(timeout)))
}
