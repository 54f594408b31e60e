//! Completion response types.
//!
//! A chat-completions response is decoded into a [`CompletionResponse`],
//! which keeps the raw body (it is forwarded verbatim in the `completed`
//! progress event) alongside the parts the loop reads: the assistant text,
//! the raw `tool_calls` entries and the finish reason.
//!
//! # Raw vs extracted tool calls
//!
//! ```text
//! tool_calls (raw)        → requests_tools()       any entry at all?
//! extract_tool_calls()    → Vec<ToolCall>          entries with a usable name
//! ```
//!
//! Entries without a resolvable function name are dropped by extraction.

use crate::tool::entities::ToolCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::entities::Message;

/// The body did not have the chat-completions shape.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Malformed completion response: {0}")]
pub struct MalformedResponse(pub String);

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of response
    Stop,
    /// The model wants tools executed
    ToolCalls,
    /// Hit the token limit; output may be truncated
    Length,
    Other(String),
}

impl FinishReason {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "stop" => FinishReason::Stop,
            "tool_calls" | "function_call" => FinishReason::ToolCalls,
            "length" => FinishReason::Length,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// A decoded chat-completions response.
///
/// # Examples
///
/// ```
/// use chatloop_domain::session::response::CompletionResponse;
/// use serde_json::json;
///
/// let response = CompletionResponse::from_body(json!({
///     "id": "chatcmpl-1",
///     "model": "llama3-8b-instruct",
///     "choices": [{
///         "message": {
///             "role": "assistant",
///             "content": null,
///             "tool_calls": [
///                 {"id": "call_1", "type": "function",
///                  "function": {"name": "sensor_readLatest", "arguments": "{\"limit\":5}"}},
///                 {"id": "call_2", "type": "function", "function": {}}
///             ]
///         },
///         "finish_reason": "tool_calls"
///     }]
/// })).unwrap();
///
/// assert!(response.requests_tools());
/// let calls = response.extract_tool_calls();
/// assert_eq!(calls.len(), 1);
/// assert_eq!(calls[0].name, "sensor_readLatest");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Full response body as received
    pub raw: Value,
    pub id: Option<String>,
    pub model: Option<String>,
    pub content: Option<String>,
    /// `choices[0].message.tool_calls`, undecoded
    pub tool_calls: Vec<Value>,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<Value>,
    /// Inference timings (llama.cpp-style servers report these)
    pub timings: Option<Value>,
}

impl CompletionResponse {
    /// Decode a response body. Only `choices[0].message` is mandatory.
    pub fn from_body(body: Value) -> Result<Self, MalformedResponse> {
        let choice = body
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .ok_or_else(|| MalformedResponse("missing choices[0]".into()))?;
        let message = choice
            .get("message")
            .filter(|m| m.is_object())
            .ok_or_else(|| MalformedResponse("missing choices[0].message".into()))?;

        let content = message
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string);
        let tool_calls = message
            .get("tool_calls")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let finish_reason = choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .map(FinishReason::parse);

        let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
        let object = |key: &str| body.get(key).filter(|v| !v.is_null()).cloned();

        Ok(Self {
            id: text("id"),
            model: text("model"),
            usage: object("usage"),
            timings: object("timings"),
            content,
            tool_calls,
            finish_reason,
            raw: body,
        })
    }

    /// Text-only response, mostly useful for tests and fakes.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let raw = serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        });
        Self {
            raw,
            id: None,
            model: None,
            content: Some(text),
            tool_calls: Vec::new(),
            finish_reason: Some(FinishReason::Stop),
            usage: None,
            timings: None,
        }
    }

    /// Whether the assistant message carries any `tool_calls` entries.
    pub fn requests_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Tool calls with a resolvable function name, in order.
    pub fn extract_tool_calls(&self) -> Vec<ToolCall> {
        self.tool_calls.iter().filter_map(ToolCall::from_wire).collect()
    }

    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Final assistant turn for history.
    pub fn to_assistant_message(&self) -> Message {
        Message::assistant(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_text_creates_text_only_response() {
        let response = CompletionResponse::from_text("Hello, world!");
        assert_eq!(response.text(), "Hello, world!");
        assert!(!response.requests_tools());
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.raw["choices"][0]["message"]["content"], "Hello, world!");
    }

    #[test]
    fn from_body_reads_metadata() {
        let response = CompletionResponse::from_body(json!({
            "id": "chatcmpl-9",
            "model": "llama3-8b-instruct",
            "choices": [{"message": {"role": "assistant", "content": "Hi"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2},
            "timings": {"predicted_ms": 12.5}
        }))
        .unwrap();
        assert_eq!(response.id.as_deref(), Some("chatcmpl-9"));
        assert_eq!(response.model.as_deref(), Some("llama3-8b-instruct"));
        assert_eq!(response.usage.unwrap()["prompt_tokens"], 10);
        assert!(response.timings.is_some());
    }

    #[test]
    fn from_body_rejects_missing_choices() {
        assert!(CompletionResponse::from_body(json!({"id": "x"})).is_err());
        assert!(CompletionResponse::from_body(json!({"choices": []})).is_err());
        assert!(CompletionResponse::from_body(json!({"choices": [{"finish_reason": "stop"}]})).is_err());
    }

    #[test]
    fn nameless_entries_still_count_as_requesting_tools() {
        let response = CompletionResponse::from_body(json!({
            "choices": [{"message": {"role": "assistant", "tool_calls": [{"id": "c1", "function": {}}]}}]
        }))
        .unwrap();
        assert!(response.requests_tools());
        assert!(response.extract_tool_calls().is_empty());
    }

    #[test]
    fn finish_reason_parse() {
        assert_eq!(FinishReason::parse("tool_calls"), FinishReason::ToolCalls);
        assert_eq!(FinishReason::parse("length"), FinishReason::Length);
        assert_eq!(FinishReason::parse("eos"), FinishReason::Other("eos".into()));
    }
}
