//! Completion client port
//!
//! Defines the interface for talking to the chat-completions endpoint.

use async_trait::async_trait;
use chatloop_domain::{CompletionRequest, CompletionResponse, FailureReason};
use thiserror::Error;

/// Errors that can occur while calling the completion endpoint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    /// Connection-level failure (refused, reset, timed out) after retries
    #[error("Completion endpoint unavailable: {0}")]
    Unavailable(String),

    /// Non-2xx response, or a body that is not JSON
    #[error("Completion endpoint error: {message}")]
    Protocol { status: Option<u16>, message: String },

    /// 2xx JSON body that does not decode as a completion
    #[error("Failed to decode completion response: {0}")]
    Parse(String),
}

impl CompletionError {
    pub fn protocol(status: u16, message: impl Into<String>) -> Self {
        Self::Protocol {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl From<CompletionError> for FailureReason {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Unavailable(message) => FailureReason::UpstreamUnavailable { message },
            CompletionError::Protocol { status, message } => {
                FailureReason::UpstreamProtocol { status, message }
            }
            CompletionError::Parse(message) => FailureReason::UpstreamParse { message },
        }
    }
}

/// Client for the completion endpoint
///
/// Implementations apply provider defaults for options the request leaves
/// unset and retry connection-level failures only.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, CompletionError>;

    /// Model ids served by the endpoint
    async fn list_models(&self) -> Result<Vec<String>, CompletionError>;

    /// Whether the endpoint is reachable and answering
    async fn health_check(&self) -> bool {
        self.list_models().await.is_ok()
    }
}
