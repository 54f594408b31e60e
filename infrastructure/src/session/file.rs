//! JSON file session store.
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! crash mid-write leaves the previous history intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chatloop_application::{SessionStore, SessionStoreError};
use chatloop_domain::{ConversationKey, Message, validate_identifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    user_id: String,
    conversation_id: String,
    updated_at: DateTime<Utc>,
    messages: Vec<Message>,
}

pub struct JsonFileSessionStore {
    dir: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding a conversation. Both key parts must be plain identifiers.
    pub fn path_for(&self, key: &ConversationKey) -> Result<PathBuf, SessionStoreError> {
        for part in [&key.user_id, &key.conversation_id] {
            validate_identifier(part).map_err(|e| SessionStoreError::Storage(e.to_string()))?;
        }
        Ok(self
            .dir
            .join(&key.user_id)
            .join(format!("{}.json", key.conversation_id)))
    }
}

fn storage(path: &Path, e: std::io::Error) -> SessionStoreError {
    SessionStoreError::Storage(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn get(&self, key: &ConversationKey) -> Result<Vec<Message>, SessionStoreError> {
        let path = self.path_for(key)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage(&path, e)),
        };

        let file: SessionFile = serde_json::from_str(&raw).map_err(|e| SessionStoreError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(file.messages)
    }

    async fn put(&self, key: &ConversationKey, messages: Vec<Message>) -> Result<(), SessionStoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage(parent, e))?;
        }

        let count = messages.len();
        let file = SessionFile {
            user_id: key.user_id.clone(),
            conversation_id: key.conversation_id.clone(),
            updated_at: Utc::now(),
            messages,
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|e| SessionStoreError::Storage(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(|e| storage(&tmp, e))?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| storage(&path, e))?;

        debug!(conversation = %key, messages = count, path = %path.display(), "Session saved");
        Ok(())
    }

    async fn clear(&self, key: &ConversationKey) -> Result<(), SessionStoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage(&path, e)),
        }
    }
}
