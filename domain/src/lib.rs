//! Domain layer for chatloop
//!
//! This crate contains the types the tool-calling loop is built from.
//! It performs no I/O and has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! ## Conversation
//!
//! A conversation is an ordered list of [`Message`]s keyed by
//! [`ConversationKey`] (user id + conversation id). One orchestration run
//! works on a private [`ConversationState`] and writes it back when done.
//!
//! ## Tools
//!
//! Tools come from tool servers ([`ToolProvider`]), either in-process
//! ([`ToolHandler`]s) or remote over HTTP. Their public names are prefixed
//! with the server id. The model requests them through [`ToolCall`]s and
//! receives [`ToolResult`]s.
//!
//! ## Runs
//!
//! A run ends in a [`RunOutcome`]: `Completed` with the final response and
//! [`RunMetrics`], or `Failed` with a [`FailureReason`]. Along the way it
//! emits [`ProgressEvent`]s on the conversation channel.

pub mod core;
pub mod orchestration;
pub mod prompt;
pub mod session;
pub mod tool;

// Re-export commonly used types
pub use core::error::{DomainError, validate_identifier};
pub use core::validation::{ConfigIssue, ConfigIssueCode, Severity};
pub use orchestration::{
    event::{EventKind, ProgressEnvelope, ProgressEvent},
    mode::RunMode,
    value_objects::{FailureReason, RunMetrics, RunOutcome},
};
pub use prompt::PromptTemplate;
pub use session::{
    entities::{Message, Role, check_tool_correlation},
    request::{CompletionOptions, CompletionRequest},
    response::{CompletionResponse, FinishReason, MalformedResponse},
    state::{ConversationKey, ConversationState},
};
pub use tool::{
    arguments::ToolArguments,
    entities::{ToolCall, ToolDefinition, ToolDescriptor, ToolRoute, Transport},
    fingerprint::CallSignature,
    provider::{ProviderError, ToolHandler, ToolProvider},
    value_objects::{ToolError, ToolOutput, ToolResult},
};
