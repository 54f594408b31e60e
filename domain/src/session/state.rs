//! Conversation identity and per-run working state.

use crate::tool::fingerprint::CallSignature;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::entities::{Message, Role};

/// Durable identity of a conversation: `(user, conversation)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub user_id: String,
    pub conversation_id: String,
}

impl ConversationKey {
    pub fn new(user_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
        }
    }

    /// Progress channel scoped to this conversation.
    pub fn channel(&self) -> String {
        format!("private-jan-chat.{}.{}", self.user_id, self.conversation_id)
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.conversation_id)
    }
}

/// Mutable working set of one orchestration run.
///
/// Built from the persisted history plus the new user message, owned by a
/// single run, and flushed back to the session store when the run ends.
/// Messages are append-only for the lifetime of the run.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    iteration: usize,
    seen_names: HashSet<String>,
    seen_exact: HashSet<String>,
}

impl ConversationState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Advance the iteration counter and return the new value.
    pub fn begin_iteration(&mut self) -> usize {
        self.iteration += 1;
        self.iteration
    }

    /// Whether the history already opens with a system message.
    pub fn has_leading_system(&self) -> bool {
        self.messages
            .first()
            .is_some_and(|m| m.role == Role::System)
    }

    /// Put a system message in front of the history.
    pub fn prepend_system(&mut self, prompt: impl Into<String>) {
        self.messages.insert(0, Message::system(prompt));
    }

    /// True if either fingerprint matches any earlier call set.
    pub fn is_repeated(&self, signature: &CallSignature) -> bool {
        self.seen_names.contains(&signature.names) || self.seen_exact.contains(&signature.exact)
    }

    pub fn record(&mut self, signature: CallSignature) {
        self.seen_names.insert(signature.names);
        self.seen_exact.insert(signature.exact);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::arguments::ToolArguments;
    use crate::tool::entities::ToolCall;

    fn signature(name: &str, args: &str) -> CallSignature {
        CallSignature::of(&[ToolCall::new("c", name, ToolArguments::parse(args))])
    }

    #[test]
    fn test_channel_name() {
        let key = ConversationKey::new("42", "conv-1");
        assert_eq!(key.channel(), "private-jan-chat.42.conv-1");
    }

    #[test]
    fn test_iteration_counter_starts_at_zero() {
        let mut state = ConversationState::new(vec![Message::user("hi")]);
        assert_eq!(state.iteration(), 0);
        assert_eq!(state.begin_iteration(), 1);
        assert_eq!(state.begin_iteration(), 2);
    }

    #[test]
    fn test_repetition_by_name_or_exact() {
        let mut state = ConversationState::default();
        let first = signature("sensor_readLatest", r#"{"limit":5}"#);
        assert!(!state.is_repeated(&first));
        state.record(first.clone());

        assert!(state.is_repeated(&first));
        assert!(state.is_repeated(&signature("sensor_readLatest", r#"{"limit":50}"#)));
        assert!(!state.is_repeated(&signature("sensor_readAll", r#"{"limit":5}"#)));
    }

    #[test]
    fn test_prepend_system() {
        let mut state = ConversationState::new(vec![Message::user("hi")]);
        assert!(!state.has_leading_system());
        state.prepend_system("rules");
        assert!(state.has_leading_system());
        assert_eq!(state.messages()[1].text(), "hi");
    }
}
