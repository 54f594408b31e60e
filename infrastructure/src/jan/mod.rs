//! Completion endpoint adapter.
//!
//! [`JanCompletionClient`] implements the
//! [`CompletionClient`](chatloop_application::CompletionClient) port against
//! any server speaking the OpenAI chat-completions protocol.

pub mod client;
pub mod protocol;

pub use client::{JanCompletionClient, JanSettings};
pub use protocol::ProviderDefaults;
