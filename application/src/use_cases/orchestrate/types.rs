//! Input types for the orchestration loop.

use chatloop_domain::{CompletionOptions, ConversationKey, Message, RunMode};

/// Input for one orchestration run.
#[derive(Debug, Clone)]
pub struct RunInput {
    pub key: ConversationKey,
    /// The new user message
    pub message: String,
    /// Replaces the default system prompt for conversations without one
    pub system_prompt: Option<String>,
    pub options: CompletionOptions,
    pub mode: RunMode,
    /// History to start from. When `None`, it is loaded from the session store.
    pub history: Option<Vec<Message>>,
}

impl RunInput {
    pub fn new(key: ConversationKey, message: impl Into<String>) -> Self {
        Self {
            key,
            message: message.into(),
            system_prompt: None,
            options: CompletionOptions::default(),
            mode: RunMode::default(),
            history: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = Some(history);
        self
    }
}
