//! Agent loop configuration from TOML (`[agent]` section)

use chatloop_application::{DEFAULT_TOOL_RESULT_PREFIX, ExecutionParams};
use chatloop_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Raw agent loop configuration from TOML
///
/// # Example
///
/// ```toml
/// [agent]
/// max_iterations = 5
/// system_prompt = "You are a plant operations assistant."
/// tool_result_prefix = "[TOOL EXECUTION COMPLETE] "
/// continue_without_tools = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    /// Ceiling on tool-calling iterations per run
    pub max_iterations: usize,
    /// Replaces the default tool-usage prompt
    pub system_prompt: Option<String>,
    pub tool_result_prefix: String,
    /// Answer without tools when the catalog cannot be fetched
    pub continue_without_tools: bool,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            system_prompt: None,
            tool_result_prefix: DEFAULT_TOOL_RESULT_PREFIX.to_string(),
            continue_without_tools: true,
        }
    }
}

impl FileAgentConfig {
    /// Build loop parameters, falling back to defaults for unusable values.
    pub fn to_execution_params(&self) -> (ExecutionParams, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut params = ExecutionParams::default()
            .with_tool_result_prefix(self.tool_result_prefix.clone())
            .with_continue_without_tools(self.continue_without_tools);

        if self.max_iterations == 0 {
            issues.push(ConfigIssue::invalid_value(
                "agent.max_iterations",
                "0",
                format!(
                    "agent.max_iterations must be at least 1, falling back to {}",
                    params.max_iterations
                ),
            ));
        } else {
            params = params.with_max_iterations(self.max_iterations);
        }

        if let Some(prompt) = self.system_prompt.as_deref()
            && !prompt.trim().is_empty()
        {
            params = params.with_system_prompt(prompt);
        }

        (params, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatloop_domain::PromptTemplate;

    #[test]
    fn test_defaults_match_execution_params() {
        let (params, issues) = FileAgentConfig::default().to_execution_params();
        assert!(issues.is_empty());
        assert_eq!(params.max_iterations, 5);
        assert_eq!(params.system_prompt, PromptTemplate::default_system());
        assert_eq!(params.tool_result_prefix, DEFAULT_TOOL_RESULT_PREFIX);
        assert!(params.continue_without_tools);
    }

    #[test]
    fn test_zero_iterations_falls_back() {
        let config = FileAgentConfig {
            max_iterations: 0,
            ..Default::default()
        };
        let (params, issues) = config.to_execution_params();
        assert_eq!(params.max_iterations, 5);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_custom_prompt() {
        let config = FileAgentConfig {
            system_prompt: Some("Be brief.".into()),
            max_iterations: 3,
            ..Default::default()
        };
        let (params, _) = config.to_execution_params();
        assert_eq!(params.system_prompt, "Be brief.");
        assert_eq!(params.max_iterations, 3);
    }
}
