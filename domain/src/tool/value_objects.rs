//! Tool domain value objects: invocation outcomes and errors.
//!
//! Every invocation, successful or not, ends up as a [`ToolResult`] so a
//! batch of calls always yields one result per call. Failures are encoded
//! into the result content rather than raised:
//!
//! ```text
//! ok:true   content = <tool payload as JSON>
//! ok:false  content = {"error": "<message>", "success": false}
//! ```

use crate::session::entities::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::entities::ToolCall;

/// Error raised by an in-process tool handler.
///
/// | Code | Meaning |
/// |------|---------|
/// | `INVALID_ARGUMENT` | Missing or malformed arguments |
/// | `NOT_FOUND` | Requested resource does not exist |
/// | `EXECUTION_FAILED` | Anything else that went wrong at runtime |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    pub code: String,
    pub message: String,
}

impl ToolError {
    pub const INVALID_ARGUMENT: &'static str = "INVALID_ARGUMENT";
    pub const NOT_FOUND: &'static str = "NOT_FOUND";
    pub const EXECUTION_FAILED: &'static str = "EXECUTION_FAILED";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_ARGUMENT, message)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(Self::NOT_FOUND, format!("Resource not found: {}", resource.into()))
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new(Self::EXECUTION_FAILED, message)
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ToolError {}

/// What an in-process handler hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Plain text, wrapped as a single MCP text content block
    Text(String),
    /// Structured payload, passed through untouched
    Structured(Value),
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Payload in the shape a remote server would have returned.
    pub fn into_payload(self) -> Value {
        match self {
            ToolOutput::Text(text) => json!({
                "content": [{ "type": "text", "text": text }]
            }),
            ToolOutput::Structured(value) => value,
        }
    }
}

/// Outcome of one tool invocation, correlated to its call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub name: String,
    /// Serialized payload, or an error descriptor when `ok` is false
    pub content: String,
    pub ok: bool,
}

impl ToolResult {
    pub fn success(call: &ToolCall, payload: &Value) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content: payload.to_string(),
            ok: true,
        }
    }

    pub fn failure(call: &ToolCall, error: impl std::fmt::Display) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content: json!({ "error": error.to_string(), "success": false }).to_string(),
            ok: false,
        }
    }

    /// `tool` role message carrying this result, with `prefix` prepended to
    /// the content.
    pub fn to_message(&self, prefix: &str) -> Message {
        Message::tool(
            self.tool_call_id.clone(),
            self.name.clone(),
            format!("{}{}", prefix, self.content),
        )
    }
}
