//! Progress events emitted over the lifetime of a run.
//!
//! Every event is scoped to a conversation channel and stamped with the
//! time it was produced. Serialized events look like:
//!
//! ```text
//! {
//!   "event": "jan.tools.executing",
//!   "channel": "private-jan-chat.42.conv-1",
//!   "status": "tools_executing",
//!   "tool_calls": [...],
//!   "iteration": 2,
//!   "timestamp": "2026-01-01T12:00:00Z"
//! }
//! ```

use crate::tool::entities::ToolCall;
use crate::tool::value_objects::ToolResult;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::value_objects::RunMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Queued,
    ApiResponding,
    ToolsExecuting,
    ToolsCompleted,
    Completed,
    Failed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Queued => "queued",
            EventKind::ApiResponding => "api_responding",
            EventKind::ToolsExecuting => "tools_executing",
            EventKind::ToolsCompleted => "tools_completed",
            EventKind::Completed => "completed",
            EventKind::Failed => "failed",
        }
    }

    /// Name the event is broadcast under.
    pub fn broadcast_name(&self) -> &'static str {
        match self {
            EventKind::Queued => "jan.chat.queued",
            EventKind::ApiResponding => "jan.api.responding",
            EventKind::ToolsExecuting => "jan.tools.executing",
            EventKind::ToolsCompleted => "jan.tools.completed",
            EventKind::Completed => "jan.chat.completed",
            EventKind::Failed => "jan.chat.failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Completed | EventKind::Failed)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Queued {
        message: String,
        context: Value,
    },
    ApiResponding {
        iteration: usize,
        has_tool_calls: bool,
    },
    ToolsExecuting {
        tool_calls: Vec<ToolCall>,
        iteration: usize,
    },
    ToolsCompleted {
        results: Vec<ToolResult>,
        iteration: usize,
    },
    Completed {
        /// Full completion payload as received
        response: Value,
        metrics: RunMetrics,
    },
    Failed {
        error: String,
        context: Value,
    },
}

impl ProgressEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ProgressEvent::Queued { .. } => EventKind::Queued,
            ProgressEvent::ApiResponding { .. } => EventKind::ApiResponding,
            ProgressEvent::ToolsExecuting { .. } => EventKind::ToolsExecuting,
            ProgressEvent::ToolsCompleted { .. } => EventKind::ToolsCompleted,
            ProgressEvent::Completed { .. } => EventKind::Completed,
            ProgressEvent::Failed { .. } => EventKind::Failed,
        }
    }

    /// Event fields plus `status`.
    pub fn payload(&self) -> Value {
        let status = self.kind().as_str();
        match self {
            ProgressEvent::Queued { message, context } => json!({
                "status": status, "message": message, "context": context,
            }),
            ProgressEvent::ApiResponding {
                iteration,
                has_tool_calls,
            } => json!({
                "status": status, "iteration": iteration, "has_tool_calls": has_tool_calls,
            }),
            ProgressEvent::ToolsExecuting {
                tool_calls,
                iteration,
            } => json!({
                "status": status, "tool_calls": tool_calls, "iteration": iteration,
            }),
            ProgressEvent::ToolsCompleted { results, iteration } => json!({
                "status": status, "results": results, "iteration": iteration,
            }),
            ProgressEvent::Completed { response, metrics } => json!({
                "status": status, "response": response, "metrics": metrics,
            }),
            ProgressEvent::Failed { error, context } => json!({
                "status": status, "error": error, "context": context,
            }),
        }
    }
}

/// An event bound to its channel and production time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEnvelope {
    pub channel: String,
    pub event: ProgressEvent,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEnvelope {
    pub fn new(channel: impl Into<String>, event: ProgressEvent, timestamp: DateTime<Utc>) -> Self {
        Self {
            channel: channel.into(),
            event,
            timestamp,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    pub fn to_json(&self) -> Value {
        let mut value = self.event.payload();
        value["event"] = json!(self.kind().broadcast_name());
        value["channel"] = json!(self.channel);
        value["timestamp"] = json!(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true));
        value
    }
}
