//! Execution parameters: orchestration loop control.
//!
//! [`ExecutionParams`] groups the static parameters that control the
//! tool-calling loop in [`OrchestrationLoop`](crate::use_cases::orchestrate::OrchestrationLoop).
//! Both the inline and the background path share one instance, so the two
//! modes cannot drift apart on limits.

use chatloop_domain::PromptTemplate;
use serde::{Deserialize, Serialize};

/// Prefix put in front of every tool result message.
pub const DEFAULT_TOOL_RESULT_PREFIX: &str = "[TOOL EXECUTION COMPLETE] ";

/// Orchestration loop control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Hard ceiling on tool-calling iterations.
    pub max_iterations: usize,
    /// System prompt placed in front of histories that lack one.
    pub system_prompt: String,
    /// Prepended to the content of every `tool` message.
    pub tool_result_prefix: String,
    /// Whether a strict catalog failure degrades to a no-tools completion
    /// instead of failing the run.
    pub continue_without_tools: bool,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            system_prompt: PromptTemplate::default_system().to_string(),
            tool_result_prefix: DEFAULT_TOOL_RESULT_PREFIX.to_string(),
            continue_without_tools: true,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_tool_result_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tool_result_prefix = prefix.into();
        self
    }

    pub fn with_continue_without_tools(mut self, enabled: bool) -> Self {
        self.continue_without_tools = enabled;
        self
    }
}
