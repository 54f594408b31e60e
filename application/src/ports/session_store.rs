//! Session store port
//!
//! Durable conversation history keyed by `(user, conversation)`. The loop
//! reads a copy at the start of a run and writes the whole sequence back at
//! the end; stores never see partial updates.

use async_trait::async_trait;
use chatloop_domain::{ConversationKey, Message};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Corrupt session data for {key}: {message}")]
    Corrupt { key: String, message: String },
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// History of a conversation; empty when unknown.
    async fn get(&self, key: &ConversationKey) -> Result<Vec<Message>, SessionStoreError>;

    /// Replace the history of a conversation.
    async fn put(&self, key: &ConversationKey, messages: Vec<Message>) -> Result<(), SessionStoreError>;

    async fn clear(&self, key: &ConversationKey) -> Result<(), SessionStoreError>;
}
