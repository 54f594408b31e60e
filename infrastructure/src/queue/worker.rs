//! Tokio-backed job queue.
//!
//! Jobs are received by a dispatcher task and each one runs on its own
//! spawned task. An attempt is retried, from the job's original input
//! snapshot, when it:
//!
//! - panicked,
//! - exceeded the per-attempt timeout, or
//! - finished `Failed` with a transient reason (completion endpoint unreachable).
//!
//! Any other outcome is final. Once the last allowed attempt fails the
//! handler's `on_permanent_failure` is called exactly once.
//!
//! ```text
//! enqueue ──▶ mpsc ──▶ dispatcher ──spawn──▶ attempt 1 ──fail──▶ backoff ──▶ attempt 2 ...
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chatloop_application::{ChatJob, JobHandler, JobQueue, QueueError};
use chatloop_domain::RunOutcome;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::FileQueueConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    /// Attempts per job, including the first
    pub tries: u32,
    pub backoff: Duration,
    /// Limit for a single attempt
    pub timeout: Duration,
}

impl QueueSettings {
    pub fn from_config(config: &FileQueueConfig) -> Self {
        Self {
            tries: config.tries.max(1),
            backoff: config.backoff(),
            timeout: config.timeout(),
        }
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self::from_config(&FileQueueConfig::default())
    }
}

pub struct TokioJobQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<ChatJob>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl TokioJobQueue {
    /// Start the dispatcher on the current runtime.
    pub fn start(handler: Arc<dyn JobHandler>, settings: QueueSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = tokio::spawn(dispatch(rx, handler, settings));
        info!(tries = settings.tries, timeout = ?settings.timeout, "Job queue started");
        Self {
            sender: Mutex::new(Some(tx)),
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    /// Stop accepting jobs and wait for queued and running ones to finish.
    pub async fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        let dispatcher = self.dispatcher.lock().ok().and_then(|mut d| d.take());
        if let Some(dispatcher) = dispatcher
            && let Err(e) = dispatcher.await
        {
            error!(error = %e, "Job dispatcher ended abnormally");
        }
    }
}

#[async_trait]
impl JobQueue for TokioJobQueue {
    async fn enqueue(&self, job: ChatJob) -> Result<(), QueueError> {
        let sender = self
            .sender
            .lock()
            .ok()
            .and_then(|s| s.clone())
            .ok_or(QueueError::Closed)?;
        debug!(job_id = %job.id, conversation = %job.input.key, "Job enqueued");
        sender.send(job).map_err(|_| QueueError::Closed)
    }
}

async fn dispatch(
    mut rx: mpsc::UnboundedReceiver<ChatJob>,
    handler: Arc<dyn JobHandler>,
    settings: QueueSettings,
) {
    let mut running = JoinSet::new();
    loop {
        tokio::select! {
            job = rx.recv() => match job {
                Some(job) => {
                    running.spawn(process(job, handler.clone(), settings));
                }
                None => break,
            },
            Some(done) = running.join_next(), if !running.is_empty() => {
                if let Err(e) = done {
                    error!(error = %e, "Job task ended abnormally");
                }
            }
        }
    }

    while let Some(done) = running.join_next().await {
        if let Err(e) = done {
            error!(error = %e, "Job task ended abnormally");
        }
    }
    debug!("Job dispatcher stopped");
}

/// Run a job until it succeeds, fails for good, or runs out of tries.
async fn process(job: ChatJob, handler: Arc<dyn JobHandler>, settings: QueueSettings) {
    let tries = settings.tries.max(1);
    let mut last_error = String::new();

    for attempt in 1..=tries {
        match run_attempt(&job, handler.clone(), attempt, settings.timeout).await {
            Ok(()) => return,
            Err(e) => {
                warn!(job_id = %job.id, attempt, tries, error = %e, "Job attempt failed");
                last_error = e;
            }
        }
        if attempt < tries {
            tokio::time::sleep(settings.backoff).await;
        }
    }

    error!(job_id = %job.id, tries, error = %last_error, "Job failed permanently");
    handler.on_permanent_failure(&job, &last_error);
}

/// One attempt; `Err` means the attempt should be retried.
async fn run_attempt(
    job: &ChatJob,
    handler: Arc<dyn JobHandler>,
    attempt: u32,
    timeout: Duration,
) -> Result<(), String> {
    let task_job = job.clone();
    let mut task = tokio::spawn(async move { handler.handle(&task_job, attempt).await });

    let outcome = match tokio::time::timeout(timeout, &mut task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) if join_error.is_panic() => {
            return Err(format!("attempt {} panicked", attempt));
        }
        Ok(Err(join_error)) => return Err(join_error.to_string()),
        Err(_) => {
            task.abort();
            return Err(format!("attempt {} timed out after {:?}", attempt, timeout));
        }
    };

    match outcome {
        RunOutcome::Failed { reason, .. } if reason.is_transient() => Err(reason.to_string()),
        RunOutcome::Failed { reason, .. } => {
            info!(job_id = %job.id, reason = %reason.code(), "Job finished with a failed run");
            Ok(())
        }
        RunOutcome::Completed { .. } => {
            info!(job_id = %job.id, attempt, "Job completed");
            Ok(())
        }
    }
}
