use std::collections::HashMap;

use async_trait::async_trait;
use chatloop_application::{SessionStore, SessionStoreError};
use chatloop_domain::{ConversationKey, Message};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<ConversationKey, Vec<Message>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn conversation_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &ConversationKey) -> Result<Vec<Message>, SessionStoreError> {
        Ok(self.sessions.read().await.get(key).cloned().unwrap_or_default())
    }

    async fn put(&self, key: &ConversationKey, messages: Vec<Message>) -> Result<(), SessionStoreError> {
        self.sessions.write().await.insert(key.clone(), messages);
        Ok(())
    }

    async fn clear(&self, key: &ConversationKey) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(key);
        Ok(())
    }
}
