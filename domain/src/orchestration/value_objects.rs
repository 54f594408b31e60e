//! Orchestration run outcomes.

use crate::session::response::CompletionResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// Metrics reported with a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Completion calls made, including a loop-recovery attempt
    pub iterations: usize,
    pub duration_seconds: f64,
    /// Messages in the history once the run finished
    pub message_count: usize,
}

/// Why a run ended in `Failed`.
///
/// Loop-specific reasons are kept apart from transport errors so callers
/// can tell "the model never converged" from "something broke".
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Connection-level failure after retries were exhausted
    #[error("Completion endpoint unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// Non-2xx status or unexpected content type
    #[error("Completion endpoint error: {message}")]
    UpstreamProtocol { status: Option<u16>, message: String },

    #[error("Could not decode completion response: {message}")]
    UpstreamParse { message: String },

    /// Strict catalog policy and a tool server failed
    #[error("Tool catalog unavailable: {message}")]
    CatalogFetch { message: String },

    #[error(
        "The AI model is stuck in a tool-calling loop. Please try rephrasing your question or ask for a different analysis."
    )]
    ToolCallLoopDetected,

    /// Conversation history could not be loaded
    #[error("Session store error: {message}")]
    SessionStore { message: String },

    #[error("Maximum tool call iterations reached")]
    MaxIterationsReached { max_iterations: usize },

    #[error("Run cancelled")]
    Cancelled,
}

impl FailureReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::UpstreamUnavailable { .. } => "upstream_unavailable",
            FailureReason::UpstreamProtocol { .. } => "upstream_protocol",
            FailureReason::UpstreamParse { .. } => "upstream_parse",
            FailureReason::CatalogFetch { .. } => "catalog_fetch",
            FailureReason::SessionStore { .. } => "session_store",
            FailureReason::ToolCallLoopDetected => "tool_call_loop_detected",
            FailureReason::MaxIterationsReached { .. } => "max_iterations_reached",
            FailureReason::Cancelled => "cancelled",
        }
    }

    /// Infrastructure-level failure a background worker may re-attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureReason::UpstreamUnavailable { .. })
    }

    /// HTTP-status equivalent for synchronous callers.
    pub fn status_code(&self) -> u16 {
        match self {
            FailureReason::CatalogFetch { .. } => 502,
            _ => 500,
        }
    }

    /// Context object attached to the `failed` progress event.
    pub fn context(&self, iterations: usize) -> Value {
        let mut context = json!({ "reason": self.code(), "iterations": iterations });
        match self {
            FailureReason::MaxIterationsReached { max_iterations } => {
                context["max_iterations"] = json!(max_iterations);
            }
            FailureReason::UpstreamProtocol {
                status: Some(status),
                ..
            } => {
                context["status"] = json!(status);
            }
            _ => {}
        }
        context
    }
}

/// Terminal state of an orchestration run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed {
        response: CompletionResponse,
        metrics: RunMetrics,
    },
    Failed {
        reason: FailureReason,
        /// Iteration counter at the time of failure
        iterations: usize,
    },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    /// Final assistant text of a completed run.
    pub fn reply(&self) -> Option<&str> {
        match self {
            RunOutcome::Completed { response, .. } => Some(response.text()),
            RunOutcome::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            RunOutcome::Completed { .. } => None,
            RunOutcome::Failed { reason, .. } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_detected_message_is_user_facing() {
        let msg = FailureReason::ToolCallLoopDetected.to_string();
        assert!(msg.contains("tool-calling loop"));
        assert!(msg.contains("rephrasing"));
    }

    #[test]
    fn test_max_iterations_context() {
        let reason = FailureReason::MaxIterationsReached { max_iterations: 5 };
        assert_eq!(reason.to_string(), "Maximum tool call iterations reached");
        let context = reason.context(5);
        assert_eq!(context["max_iterations"], 5);
        assert_eq!(context["reason"], "max_iterations_reached");
    }

    #[test]
    fn test_only_unavailable_is_transient() {
        assert!(FailureReason::UpstreamUnavailable { message: "reset".into() }.is_transient());
        assert!(!FailureReason::UpstreamProtocol { status: Some(500), message: "x".into() }.is_transient());
        assert!(!FailureReason::ToolCallLoopDetected.is_transient());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(FailureReason::CatalogFetch { message: "down".into() }.status_code(), 502);
        assert_eq!(FailureReason::Cancelled.status_code(), 500);
    }

    #[test]
    fn test_reply_only_on_completed() {
        let done = RunOutcome::Completed {
            response: CompletionResponse::from_text("Hi"),
            metrics: RunMetrics {
                iterations: 1,
                duration_seconds: 0.1,
                message_count: 2,
            },
        };
        assert_eq!(done.reply(), Some("Hi"));
        assert!(done.failure().is_none());

        let failed = RunOutcome::Failed {
            reason: FailureReason::Cancelled,
            iterations: 0,
        };
        assert_eq!(failed.reply(), None);
        assert!(!failed.is_completed());
    }
}
