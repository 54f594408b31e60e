//! Conversation session domain.
//!
//! - [`entities::Message`]: a single turn, in chat-completions wire shape
//! - [`request::CompletionRequest`]: what is sent to the completion endpoint
//! - [`response::CompletionResponse`]: what comes back
//! - [`state::ConversationState`]: the working set of one orchestration run
//! - [`state::ConversationKey`]: `(user, conversation)` identity

pub mod entities;
pub mod request;
pub mod response;
pub mod state;
