//! Chat service use case.
//!
//! Entry point for callers. Validates a [`ChatRequest`] and either runs the
//! [`OrchestrationLoop`] inline or snapshots the history and hands the run
//! to a [`JobQueue`]. [`ChatJobRunner`] is the worker side of the second
//! path.

use async_trait::async_trait;
use chatloop_domain::{
    CompletionOptions, ConversationKey, DomainError, FailureReason, Message, ProgressEvent,
    RunMetrics, RunMode, RunOutcome, validate_identifier,
};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::ports::job_queue::{ChatJob, JobHandler, JobQueue, QueueError};
use crate::ports::progress::ProgressNotifier;
use crate::ports::session_store::SessionStoreError;
use crate::use_cases::orchestrate::{OrchestrationLoop, RunInput};
use crate::use_cases::shared::ChannelEmitter;

/// Conversation id that asks for a fresh conversation.
const DEFAULT_CONVERSATION: &str = "default";

/// A chat message from a caller.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub user_id: String,
    /// Missing, blank or `"default"` starts a new conversation
    pub conversation_id: Option<String>,
    pub message: String,
    pub system_prompt: Option<String>,
    pub options: CompletionOptions,
}

impl ChatRequest {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_id: None,
            message: message.into(),
            system_prompt: None,
            options: CompletionOptions::default(),
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }
}

/// Result of an inline run.
#[derive(Debug, Clone)]
pub struct SyncReply {
    pub conversation_id: String,
    pub reply: String,
    /// Completion payload as received
    pub response: Value,
    pub metrics: RunMetrics,
}

impl SyncReply {
    pub fn to_json(&self) -> Value {
        json!({
            "success": true,
            "conversation_id": self.conversation_id,
            "reply": self.reply,
            "response": self.response,
            "metrics": self.metrics,
        })
    }
}

/// Acknowledgement of a queued run.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub conversation_id: String,
    pub user_id: String,
    /// Channel the run's events are published on
    pub channel: String,
    pub job_id: String,
}

impl Accepted {
    pub fn to_json(&self) -> Value {
        json!({
            "success": true,
            "message": "Request queued for processing",
            "conversation_id": self.conversation_id,
            "user_id": self.user_id,
            "channel": self.channel,
            "job_id": self.job_id,
            "async": true,
        })
    }
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("{reason}")]
    Failed { reason: FailureReason, iterations: usize },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Session(#[from] SessionStoreError),

    #[error("Background processing is not configured")]
    AsyncUnavailable,
}

impl ChatError {
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::Invalid(_) => "invalid_request",
            ChatError::Failed { reason, .. } => reason.code(),
            ChatError::Queue(_) | ChatError::AsyncUnavailable => "queue_unavailable",
            ChatError::Session(_) => "session_store",
        }
    }

    /// HTTP-status equivalent.
    pub fn status_code(&self) -> u16 {
        match self {
            ChatError::Invalid(_) => 422,
            ChatError::Failed { reason, .. } => reason.status_code(),
            ChatError::Queue(_) | ChatError::AsyncUnavailable => 503,
            ChatError::Session(_) => 500,
        }
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "success": false,
            "error": self.code(),
            "message": self.to_string(),
        })
    }
}

pub struct ChatService {
    orchestrator: Arc<OrchestrationLoop>,
    queue: Option<Arc<dyn JobQueue>>,
}

impl ChatService {
    pub fn new(orchestrator: Arc<OrchestrationLoop>) -> Self {
        Self {
            orchestrator,
            queue: None,
        }
    }

    pub fn with_queue(mut self, queue: Arc<dyn JobQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn orchestrator(&self) -> &Arc<OrchestrationLoop> {
        &self.orchestrator
    }

    /// Run the loop in the caller's task and return its final answer.
    pub async fn send_sync(
        &self,
        request: ChatRequest,
        progress: &dyn ProgressNotifier,
        cancellation: Option<CancellationToken>,
    ) -> Result<SyncReply, ChatError> {
        let key = resolve_key(&request)?;
        let conversation_id = key.conversation_id.clone();
        let input = RunInput::new(key, request.message)
            .with_system_prompt(request.system_prompt)
            .with_options(request.options);

        match self.orchestrator.run(input, progress, cancellation).await {
            RunOutcome::Completed { response, metrics } => Ok(SyncReply {
                conversation_id,
                reply: response.text().to_string(),
                response: response.raw,
                metrics,
            }),
            RunOutcome::Failed { reason, iterations } => Err(ChatError::Failed { reason, iterations }),
        }
    }

    /// Queue the run and return as soon as it is accepted.
    ///
    /// The history is snapshotted now; every attempt of the job starts from
    /// that snapshot.
    pub async fn dispatch_async(&self, request: ChatRequest) -> Result<Accepted, ChatError> {
        let queue = self.queue.as_ref().ok_or(ChatError::AsyncUnavailable)?;
        let key = resolve_key(&request)?;
        let history = self.orchestrator.sessions().get(&key).await?;

        let job_id = Uuid::new_v4().to_string();
        let accepted = Accepted {
            conversation_id: key.conversation_id.clone(),
            user_id: key.user_id.clone(),
            channel: key.channel(),
            job_id: job_id.clone(),
        };
        let input = RunInput::new(key, request.message)
            .with_system_prompt(request.system_prompt)
            .with_options(request.options)
            .with_mode(RunMode::Background)
            .with_history(history);

        queue.enqueue(ChatJob { id: job_id, input }).await?;
        info!(
            job_id = %accepted.job_id,
            user_id = %accepted.user_id,
            conversation_id = %accepted.conversation_id,
            "Chat request queued"
        );
        Ok(accepted)
    }

    pub async fn history(&self, key: &ConversationKey) -> Result<Vec<Message>, ChatError> {
        Ok(self.orchestrator.sessions().get(key).await?)
    }

    pub async fn clear(&self, key: &ConversationKey) -> Result<(), ChatError> {
        Ok(self.orchestrator.sessions().clear(key).await?)
    }
}

fn resolve_key(request: &ChatRequest) -> Result<ConversationKey, ChatError> {
    if request.message.trim().is_empty() {
        return Err(DomainError::EmptyMessage.into());
    }
    validate_identifier(&request.user_id)?;

    let conversation_id = match request.conversation_id.as_deref().map(str::trim) {
        None | Some("") | Some(DEFAULT_CONVERSATION) => Uuid::new_v4().to_string(),
        Some(id) => {
            validate_identifier(id)?;
            id.to_string()
        }
    };
    Ok(ConversationKey::new(request.user_id.clone(), conversation_id))
}

/// Worker-side handler for queued chat runs.
pub struct ChatJobRunner {
    orchestrator: Arc<OrchestrationLoop>,
    progress: Arc<dyn ProgressNotifier>,
}

impl ChatJobRunner {
    pub fn new(orchestrator: Arc<OrchestrationLoop>, progress: Arc<dyn ProgressNotifier>) -> Self {
        Self {
            orchestrator,
            progress,
        }
    }

    fn emitter(&self, job: &ChatJob) -> ChannelEmitter<'_> {
        ChannelEmitter::new(
            self.progress.as_ref(),
            self.orchestrator.clock().as_ref(),
            job.input.key.channel(),
        )
    }
}

#[async_trait]
impl JobHandler for ChatJobRunner {
    async fn handle(&self, job: &ChatJob, attempt: u32) -> RunOutcome {
        self.emitter(job).emit(ProgressEvent::Queued {
            message: "Processing your message...".to_string(),
            context: json!({ "iteration": 0, "job_id": job.id, "attempt": attempt }),
        });
        self.orchestrator
            .run(job.input.clone(), self.progress.as_ref(), None)
            .await
    }

    fn on_permanent_failure(&self, job: &ChatJob, error: &str) {
        error!(job_id = %job.id, conversation = %job.input.key, error, "Chat job failed permanently");
        self.emitter(job).emit(ProgressEvent::Failed {
            error: format!("Job failed after multiple retries: {}", error),
            context: json!({ "reason": "job_failed", "job_id": job.id }),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogPolicy;
    use crate::ports::completion_client::CompletionError;
    use crate::use_cases::test_support::{
        MemoryCache, MemorySessions, RecordingProgress, Scripted, ScriptedCompletion, StaticProvider,
    };
    use crate::use_cases::tool_catalog::ToolCatalog;
    use chatloop_domain::{EventKind, Role, ToolProvider, Transport};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingQueue {
        jobs: Mutex<Vec<ChatJob>>,
        closed: bool,
    }

    #[async_trait]
    impl JobQueue for RecordingQueue {
        async fn enqueue(&self, job: ChatJob) -> Result<(), QueueError> {
            if self.closed {
                return Err(QueueError::Closed);
            }
            self.jobs.lock().unwrap().push(job);
            Ok(())
        }
    }

    fn orchestrator(script: Vec<Scripted>, sessions: Arc<MemorySessions>) -> Arc<OrchestrationLoop> {
        let providers: Vec<Arc<dyn ToolProvider>> =
            vec![Arc::new(StaticProvider::new("sensor", Transport::InProcess, &[]))];
        let catalog = Arc::new(ToolCatalog::new(
            providers,
            Arc::new(MemoryCache::default()),
            CatalogPolicy::default(),
        ));
        Arc::new(OrchestrationLoop::new(
            Arc::new(ScriptedCompletion::new(script)),
            catalog,
            sessions,
        ))
    }

    #[tokio::test]
    async fn test_send_sync_returns_reply() {
        let service = ChatService::new(orchestrator(vec![Scripted::text("Hi!")], Arc::default()));
        let progress = RecordingProgress::default();

        let reply = service
            .send_sync(ChatRequest::new("42", "Hello").with_conversation("conv-1"), &progress, None)
            .await
            .unwrap();

        assert_eq!(reply.conversation_id, "conv-1");
        assert_eq!(reply.reply, "Hi!");
        assert_eq!(reply.metrics.iterations, 1);
        assert_eq!(reply.to_json()["success"], true);
    }

    #[tokio::test]
    async fn test_default_conversation_gets_fresh_id() {
        let service = ChatService::new(orchestrator(vec![Scripted::text("a")], Arc::default()));

        let reply = service
            .send_sync(
                ChatRequest::new("42", "Hello").with_conversation("default"),
                &RecordingProgress::default(),
                None,
            )
            .await
            .unwrap();

        assert_ne!(reply.conversation_id, "default");
        assert!(Uuid::parse_str(&reply.conversation_id).is_ok());
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let service = ChatService::new(orchestrator(vec![], Arc::default()));

        let err = service
            .send_sync(ChatRequest::new("42", "   "), &RecordingProgress::default(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Invalid(DomainError::EmptyMessage)));
        assert_eq!(err.status_code(), 422);
    }

    #[tokio::test]
    async fn test_invalid_conversation_id_rejected() {
        let service = ChatService::new(orchestrator(vec![], Arc::default()));

        let err = service
            .send_sync(
                ChatRequest::new("42", "Hello").with_conversation("../etc"),
                &RecordingProgress::default(),
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Invalid(DomainError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn test_failed_run_maps_to_error_payload() {
        let script = vec![Scripted::Error(
            CompletionError::Unavailable("connection refused".into()),
        )];
        let service = ChatService::new(orchestrator(script, Arc::default()));

        let err = service
            .send_sync(ChatRequest::new("42", "Hello"), &RecordingProgress::default(), None)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 500);
        let payload = err.to_payload();
        assert_eq!(payload["success"], false);
        assert_eq!(payload["error"], "upstream_unavailable");
        assert!(payload["message"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_dispatch_async_snapshots_history() {
        let key = ConversationKey::new("42", "conv-1");
        let sessions = Arc::new(MemorySessions::with_history(
            &key,
            vec![Message::user("earlier"), Message::assistant("reply")],
        ));
        let queue = Arc::new(RecordingQueue::default());
        let service = ChatService::new(orchestrator(vec![], sessions)).with_queue(queue.clone());

        let accepted = service
            .dispatch_async(ChatRequest::new("42", "Next").with_conversation("conv-1"))
            .await
            .unwrap();

        assert_eq!(accepted.channel, "private-jan-chat.42.conv-1");
        let json = accepted.to_json();
        assert_eq!(json["async"], true);
        assert_eq!(json["message"], "Request queued for processing");

        let jobs = queue.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, accepted.job_id);
        assert_eq!(jobs[0].input.mode, RunMode::Background);
        assert_eq!(jobs[0].input.history.as_ref().map(Vec::len), Some(2));
        assert_eq!(jobs[0].input.message, "Next");
    }

    #[tokio::test]
    async fn test_dispatch_async_without_queue() {
        let service = ChatService::new(orchestrator(vec![], Arc::default()));

        let err = service.dispatch_async(ChatRequest::new("42", "Hi")).await.unwrap_err();
        assert!(matches!(err, ChatError::AsyncUnavailable));
        assert_eq!(err.status_code(), 503);
    }

    #[tokio::test]
    async fn test_dispatch_async_closed_queue() {
        let queue = Arc::new(RecordingQueue {
            closed: true,
            ..Default::default()
        });
        let service = ChatService::new(orchestrator(vec![], Arc::default())).with_queue(queue);

        let err = service.dispatch_async(ChatRequest::new("42", "Hi")).await.unwrap_err();
        assert!(matches!(err, ChatError::Queue(QueueError::Closed)));
    }

    #[tokio::test]
    async fn test_job_runner_emits_queued_then_runs() {
        let sessions: Arc<MemorySessions> = Arc::default();
        let orchestrator = orchestrator(vec![Scripted::text("Background answer")], sessions.clone());
        let progress = Arc::new(RecordingProgress::default());
        let runner = ChatJobRunner::new(orchestrator, progress.clone());

        let key = ConversationKey::new("42", "conv-9");
        let job = ChatJob {
            id: "job-1".into(),
            input: RunInput::new(key.clone(), "Hello")
                .with_mode(RunMode::Background)
                .with_history(Vec::new()),
        };
        let outcome = runner.handle(&job, 1).await;

        assert_eq!(outcome.reply(), Some("Background answer"));
        assert_eq!(progress.kinds().first(), Some(&EventKind::Queued));
        assert_eq!(progress.kinds().last(), Some(&EventKind::Completed));
        let queued = progress.last(EventKind::Queued).unwrap();
        assert_eq!(queued["message"], "Processing your message...");
        assert_eq!(queued["context"]["job_id"], "job-1");

        let stored = sessions.stored(&key).unwrap();
        assert_eq!(stored.last().unwrap().role, Role::Assistant);
    }

    fn terminal_kinds(progress: &RecordingProgress) -> Vec<EventKind> {
        progress.kinds().into_iter().filter(|k| k.is_terminal()).collect()
    }

    fn background_job(id: &str) -> ChatJob {
        ChatJob {
            id: id.into(),
            input: RunInput::new(ConversationKey::new("42", "conv-r"), "Hello")
                .with_mode(RunMode::Background)
                .with_history(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_job_retry_after_transient_failure_has_one_terminal_event() {
        let script = vec![
            Scripted::Error(CompletionError::Unavailable("connection reset".into())),
            Scripted::text("Recovered answer"),
        ];
        let progress = Arc::new(RecordingProgress::default());
        let runner = ChatJobRunner::new(orchestrator(script, Arc::default()), progress.clone());
        let job = background_job("job-r");

        let first = runner.handle(&job, 1).await;
        assert!(first.failure().is_some_and(FailureReason::is_transient));
        assert!(terminal_kinds(&progress).is_empty());

        let second = runner.handle(&job, 2).await;
        assert_eq!(second.reply(), Some("Recovered answer"));
        assert_eq!(terminal_kinds(&progress), vec![EventKind::Completed]);
    }

    #[tokio::test]
    async fn test_job_exhausted_transient_failures_have_one_terminal_event() {
        let script = vec![
            Scripted::Error(CompletionError::Unavailable("connection reset".into())),
            Scripted::Error(CompletionError::Unavailable("connection reset".into())),
        ];
        let progress = Arc::new(RecordingProgress::default());
        let runner = ChatJobRunner::new(orchestrator(script, Arc::default()), progress.clone());
        let job = background_job("job-x");

        runner.handle(&job, 1).await;
        runner.handle(&job, 2).await;
        runner.on_permanent_failure(&job, "Completion endpoint unavailable: connection reset");

        assert_eq!(terminal_kinds(&progress), vec![EventKind::Failed]);
        let failed = progress.last(EventKind::Failed).unwrap();
        assert!(failed["error"].as_str().unwrap().starts_with("Job failed after multiple retries"));
    }

    #[tokio::test]
    async fn test_job_runner_permanent_failure_event() {
        let progress = Arc::new(RecordingProgress::default());
        let runner = ChatJobRunner::new(orchestrator(vec![], Arc::default()), progress.clone());
        let job = ChatJob {
            id: "job-2".into(),
            input: RunInput::new(ConversationKey::new("42", "c"), "Hello"),
        };

        runner.on_permanent_failure(&job, "attempt timed out");

        let failed = progress.last(EventKind::Failed).unwrap();
        assert_eq!(failed["error"], "Job failed after multiple retries: attempt timed out");
        assert_eq!(failed["channel"], "private-jan-chat.42.c");
    }
}
