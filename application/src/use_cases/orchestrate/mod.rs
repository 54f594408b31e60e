//! Orchestration loop use case.
//!
//! Drives one chat run through the tool-calling state machine:
//!
//! ```text
//! Init ─▶ Requesting ─┬─▶ FinalAnswer ─────────────────────────────▶ Completed
//!            ▲        │
//!            │        └─▶ ToolCalls ─┬─ new call set ─▶ Executing ─┐
//!            │                       │                             │
//!            └───────────────────────┼─────────────────────────────┘
//!                                    │
//!                                    └─ repeated ─▶ Recovery ─┬─ text ─▶ Completed
//!                                                             └─ tools ─▶ Failed
//! ```
//!
//! # Per-iteration algorithm
//!
//! 1. Bump the iteration counter, emit `api_responding`.
//! 2. Call the completion endpoint with the history and the catalog (the
//!    catalog is left out entirely when empty, and then no tool calls are
//!    extracted either).
//! 3. No usable tool calls: append the answer, persist, emit `completed`.
//! 4. Tool calls: emit `tools_executing`, fingerprint the call set.
//! 5. Repeated set (same names *or* same name+args as an earlier turn):
//!    send one text-only request with a corrective system message. Clean
//!    text completes the run; any further `tool_calls` fail it with
//!    [`FailureReason::ToolCallLoopDetected`].
//! 6. New set: record it, invoke sequentially, emit `tools_completed`,
//!    append the assistant turn and one `tool` message per result. Fail with
//!    [`FailureReason::MaxIterationsReached`] once the ceiling is hit.
//!
//! Every terminal path persists the history (partial on failure) and emits
//! exactly one `completed` or `failed` event. The exception is a background
//! run failing for a transient reason: the job layer retries it and emits the
//! final `failed` itself, so subscribers still see a single terminal event. Nothing escapes as an error:
//! callers get a [`RunOutcome`].
//!
//! A run never makes more than `max_iterations + 1` completion calls.

mod types;

pub use types::RunInput;

use chatloop_domain::{
    CallSignature, CompletionOptions, CompletionRequest, CompletionResponse, ConversationKey,
    ConversationState, FailureReason, Message, ProgressEvent, PromptTemplate, RunMetrics, RunMode,
    RunOutcome, ToolDefinition,
};
use serde_json::json;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ExecutionParams;
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::completion_client::CompletionClient;
use crate::ports::progress::ProgressNotifier;
use crate::ports::session_store::SessionStore;
use crate::use_cases::shared::{ChannelEmitter, check_cancelled};
use crate::use_cases::tool_catalog::ToolCatalog;
use crate::use_cases::tool_invoker::ToolInvoker;

/// Final answer of a successful run.
struct Finished {
    response: CompletionResponse,
    /// Completion calls made, including a recovery attempt
    completion_calls: usize,
}

/// The tool-calling loop, shared by the inline and background paths.
pub struct OrchestrationLoop {
    completion: Arc<dyn CompletionClient>,
    catalog: Arc<ToolCatalog>,
    invoker: ToolInvoker,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    params: ExecutionParams,
}

impl OrchestrationLoop {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        catalog: Arc<ToolCatalog>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            invoker: ToolInvoker::new(catalog.clone()),
            completion,
            catalog,
            sessions,
            clock: Arc::new(SystemClock),
            params: ExecutionParams::default(),
        }
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn params(&self) -> &ExecutionParams {
        &self.params
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn completion(&self) -> &Arc<dyn CompletionClient> {
        &self.completion
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Run the loop to a terminal state.
    ///
    /// `cancellation` is checked before every completion request and before
    /// tools are executed; a cancelled run ends as `Failed(Cancelled)`.
    pub async fn run(
        &self,
        input: RunInput,
        progress: &dyn ProgressNotifier,
        cancellation: Option<CancellationToken>,
    ) -> RunOutcome {
        let started = Instant::now();
        let RunInput {
            key,
            message,
            system_prompt,
            options,
            mode,
            history,
        } = input;
        let events = ChannelEmitter::new(progress, self.clock.as_ref(), key.channel());

        info!(
            user_id = %key.user_id,
            conversation_id = %key.conversation_id,
            %mode,
            "Starting chat run"
        );

        let history = match history {
            Some(history) => history,
            None => match self.sessions.get(&key).await {
                Ok(history) => history,
                Err(e) => {
                    let reason = FailureReason::SessionStore {
                        message: e.to_string(),
                    };
                    return self.fail(&events, &key, reason, 0, mode);
                }
            },
        };

        let mut state = ConversationState::new(history);
        if !state.has_leading_system() {
            state.prepend_system(system_prompt.unwrap_or_else(|| self.params.system_prompt.clone()));
        }
        state.push(Message::user(message));

        let result = match self.load_tools().await {
            Ok(tools) => {
                self.drive(&mut state, &tools, &options, &events, &cancellation)
                    .await
            }
            Err(reason) => Err(reason),
        };

        let iterations = state.iteration();
        let message_count = state.messages().len();
        self.persist(&key, state.into_messages()).await;

        match result {
            Ok(Finished {
                response,
                completion_calls,
            }) => {
                let metrics = RunMetrics {
                    iterations: completion_calls,
                    duration_seconds: started.elapsed().as_secs_f64(),
                    message_count,
                };
                info!(
                    conversation_id = %key.conversation_id,
                    iterations = metrics.iterations,
                    duration_seconds = metrics.duration_seconds,
                    message_count,
                    "Chat run completed"
                );
                events.emit(ProgressEvent::Completed {
                    response: response.raw.clone(),
                    metrics,
                });
                RunOutcome::Completed { response, metrics }
            }
            Err(reason) => self.fail(&events, &key, reason, iterations, mode),
        }
    }

    async fn drive(
        &self,
        state: &mut ConversationState,
        tools: &[ToolDefinition],
        options: &CompletionOptions,
        events: &ChannelEmitter<'_>,
        cancellation: &Option<CancellationToken>,
    ) -> Result<Finished, FailureReason> {
        loop {
            check_cancelled(cancellation)?;
            let iteration = state.begin_iteration();
            events.emit(ProgressEvent::ApiResponding {
                iteration,
                has_tool_calls: false,
            });
            debug!(
                iteration,
                messages = state.messages().len(),
                tools = tools.len(),
                "Requesting completion"
            );

            let request = CompletionRequest::new(state.messages().to_vec())
                .with_tools(tools.to_vec())
                .with_options(options.clone());
            let response = self.completion.complete(&request).await?;

            // A model offered no tools is never asked to call one
            let calls = if tools.is_empty() {
                Vec::new()
            } else {
                response.extract_tool_calls()
            };

            if calls.is_empty() {
                state.push(response.to_assistant_message());
                return Ok(Finished {
                    response,
                    completion_calls: iteration,
                });
            }

            let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
            info!(iteration, tools = ?names, "Model requested tools");
            events.emit(ProgressEvent::ToolsExecuting {
                tool_calls: calls.clone(),
                iteration,
            });

            let signature = CallSignature::of(&calls);
            if state.is_repeated(&signature) {
                return self.recover(state, options, events).await;
            }
            state.record(signature);

            check_cancelled(cancellation)?;
            let results = self.invoker.invoke_many(&calls).await;
            let failed = results.iter().filter(|r| !r.ok).count();
            debug!(iteration, total = results.len(), failed, "Tool batch finished");
            events.emit(ProgressEvent::ToolsCompleted {
                results: results.clone(),
                iteration,
            });

            state.push(Message::assistant_tool_calls(response.content.clone(), calls));
            for result in &results {
                state.push(result.to_message(&self.params.tool_result_prefix));
            }

            if iteration >= self.params.max_iterations {
                return Err(FailureReason::MaxIterationsReached {
                    max_iterations: self.params.max_iterations,
                });
            }
        }
    }

    /// Single text-only retry after a repeated call set.
    ///
    /// The corrective directive is only part of this request; it is not
    /// written to the history.
    ///
    /// The recovery request counts as an iteration of its own, so failed and
    /// completed runs report the same number of completion calls.
    async fn recover(
        &self,
        state: &mut ConversationState,
        options: &CompletionOptions,
        events: &ChannelEmitter<'_>,
    ) -> Result<Finished, FailureReason> {
        let iteration = state.begin_iteration();
        warn!(iteration, "Repeated tool calls detected, requesting a text-only answer");
        events.emit(ProgressEvent::ApiResponding {
            iteration,
            has_tool_calls: false,
        });

        let mut messages = state.messages().to_vec();
        messages.push(Message::system(PromptTemplate::loop_recovery()));
        let request = CompletionRequest::new(messages).with_options(options.clone());
        let response = self.completion.complete(&request).await?;

        if response.requests_tools() {
            return Err(FailureReason::ToolCallLoopDetected);
        }

        info!(iteration, "Recovered from tool-calling loop");
        state.push(response.to_assistant_message());
        Ok(Finished {
            response,
            completion_calls: iteration,
        })
    }

    async fn load_tools(&self) -> Result<Vec<ToolDefinition>, FailureReason> {
        match self.catalog.list_all().await {
            Ok(tools) => Ok(tools),
            Err(e) if self.params.continue_without_tools => {
                warn!(error = %e, "Tool catalog unavailable, continuing without tools");
                Ok(Vec::new())
            }
            Err(e) => Err(FailureReason::CatalogFetch {
                message: e.to_string(),
            }),
        }
    }

    async fn persist(&self, key: &ConversationKey, messages: Vec<Message>) {
        if let Err(e) = self.sessions.put(key, messages).await {
            error!(conversation = %key, error = %e, "Failed to persist conversation history");
        }
    }

    fn fail(
        &self,
        events: &ChannelEmitter<'_>,
        key: &ConversationKey,
        reason: FailureReason,
        iterations: usize,
        mode: RunMode,
    ) -> RunOutcome {
        match &reason {
            FailureReason::Cancelled => info!(conversation = %key, "Chat run cancelled"),
            FailureReason::ToolCallLoopDetected | FailureReason::MaxIterationsReached { .. } => {
                warn!(conversation = %key, iterations, reason = reason.code(), "Chat run failed")
            }
            _ => error!(conversation = %key, iterations, error = %reason, "Chat run failed"),
        }

        // A retried background run reports its final failure from the job layer
        if mode == RunMode::Background && reason.is_transient() {
            debug!(conversation = %key, error = %reason, "Leaving transient failure to the job retry");
            return RunOutcome::Failed { reason, iterations };
        }

        let mut context = reason.context(iterations);
        context["mode"] = json!(mode.as_str());
        events.emit(ProgressEvent::Failed {
            error: reason.to_string(),
            context,
        });
        RunOutcome::Failed { reason, iterations }
    }
}
