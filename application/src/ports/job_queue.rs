//! Background job port
//!
//! Asynchronous chat requests are turned into [`ChatJob`]s and handed to a
//! [`JobQueue`]. A worker later feeds each job to a [`JobHandler`], retrying
//! the whole run when an attempt fails for infrastructure reasons.

use async_trait::async_trait;
use chatloop_domain::RunOutcome;
use thiserror::Error;

use crate::use_cases::orchestrate::RunInput;

/// One queued chat run.
#[derive(Debug, Clone)]
pub struct ChatJob {
    pub id: String,
    /// Input snapshot taken at dispatch; every attempt starts from it
    pub input: RunInput,
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Job queue is closed")]
    Closed,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: ChatJob) -> Result<(), QueueError>;
}

/// Executes queued jobs on behalf of a worker.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Run one attempt of `job`. `attempt` starts at 1.
    async fn handle(&self, job: &ChatJob, attempt: u32) -> RunOutcome;

    /// Called once when the worker gives up on a job.
    fn on_permanent_failure(&self, job: &ChatJob, error: &str);
}
