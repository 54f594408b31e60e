//! Completion endpoint configuration from TOML (`[jan]` section)

use serde::{Deserialize, Serialize};

/// Raw completion endpoint configuration from TOML
///
/// # Example
///
/// ```toml
/// [jan]
/// url = "http://localhost:1337"
/// auth_token = "secret"          # sent as a bearer token when set
/// model = "llama3-8b-instruct"
/// timeout_secs = 300
/// max_tokens = 4096
/// temperature = 0.7
/// connect_attempts = 2           # total tries on connection failures
/// retry_delay_ms = 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileJanConfig {
    /// Base URL of the OpenAI-compatible server
    pub url: String,
    pub auth_token: Option<String>,
    /// Model used when a request does not name one
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub connect_attempts: usize,
    pub retry_delay_ms: u64,
}

impl Default for FileJanConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:1337".to_string(),
            auth_token: None,
            model: "llama3-8b-instruct".to_string(),
            timeout_secs: 300,
            max_tokens: 4096,
            temperature: 0.7,
            connect_attempts: 2,
            retry_delay_ms: 100,
        }
    }
}

impl FileJanConfig {
    /// Token to send, ignoring blank values.
    pub fn bearer_token(&self) -> Option<&str> {
        self.auth_token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_token_is_ignored() {
        let config = FileJanConfig {
            auth_token: Some("  ".into()),
            ..Default::default()
        };
        assert!(config.bearer_token().is_none());

        let config = FileJanConfig {
            auth_token: Some("abc".into()),
            ..Default::default()
        };
        assert_eq!(config.bearer_token(), Some("abc"));
    }
}
