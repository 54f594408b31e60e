//! OpenAI-compatible completion client (Jan, llama.cpp server, LM Studio).

use async_trait::async_trait;
use backon::{ConstantBuilder, Retryable};
use chatloop_application::{CompletionClient, CompletionError};
use chatloop_domain::{CompletionRequest, CompletionResponse, core::string::preview};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::protocol::{ProviderDefaults, build_body, parse_models};
use crate::config::FileConfig;

/// Connection settings for [`JanCompletionClient`].
#[derive(Debug, Clone)]
pub struct JanSettings {
    /// Base URL without trailing slash
    pub base_url: String,
    pub auth_token: Option<String>,
    pub defaults: ProviderDefaults,
    pub timeout: Duration,
    /// Total tries when the connection fails or times out
    pub connect_attempts: usize,
    pub retry_delay: Duration,
}

impl JanSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
            defaults: ProviderDefaults {
                model: "llama3-8b-instruct".to_string(),
                max_tokens: 4096,
                temperature: 0.7,
            },
            timeout: Duration::from_secs(300),
            connect_attempts: 2,
            retry_delay: Duration::from_millis(100),
        }
    }

    pub fn from_config(config: &FileConfig) -> Self {
        let jan = &config.jan;
        Self {
            base_url: config.jan_url(),
            auth_token: jan.bearer_token().map(str::to_string),
            defaults: ProviderDefaults {
                model: jan.model.clone(),
                max_tokens: jan.max_tokens,
                temperature: jan.temperature,
            },
            timeout: Duration::from_secs(jan.timeout_secs),
            connect_attempts: jan.connect_attempts.max(1),
            retry_delay: Duration::from_millis(jan.retry_delay_ms),
        }
    }
}

pub struct JanCompletionClient {
    http: reqwest::Client,
    settings: JanSettings,
}

impl JanCompletionClient {
    pub fn new(settings: JanSettings) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| CompletionError::Unavailable(e.to_string()))?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &JanSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url, path)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.settings.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send, retrying only connection-level failures.
    async fn send<F>(&self, build: F) -> Result<reqwest::Response, CompletionError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let strategy = ConstantBuilder::default()
            .with_delay(self.settings.retry_delay)
            .with_max_times(self.settings.connect_attempts.saturating_sub(1));

        (|| async { build().send().await })
            .retry(strategy)
            .when(is_connection_error)
            .notify(|e: &reqwest::Error, delay: Duration| {
                warn!(error = %e, ?delay, "Completion endpoint unreachable, retrying");
            })
            .await
            .map_err(|e| {
                if is_connection_error(&e) {
                    CompletionError::Unavailable(e.to_string())
                } else {
                    CompletionError::Protocol {
                        status: e.status().map(|s| s.as_u16()),
                        message: e.to_string(),
                    }
                }
            })
    }

    /// Check status and content type, then decode the JSON body.
    async fn read_json(response: reqwest::Response) -> Result<Value, CompletionError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::protocol(
                status.as_u16(),
                format!("Jan API request failed with status {}: {}", status.as_u16(), body),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("json") {
            return Err(CompletionError::protocol(
                status.as_u16(),
                format!("Unexpected content type '{}'", content_type),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CompletionError::Parse(e.to_string()))
    }
}

/// Transport failures: refused, reset or dropped connections and timeouts.
///
/// Anything raised by `send` without an HTTP status never reached a complete
/// response. Builder errors are local and would fail the same way again.
fn is_connection_error(e: &reqwest::Error) -> bool {
    !e.is_builder() && e.status().is_none()
}

#[async_trait]
impl CompletionClient for JanCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, CompletionError> {
        let body = build_body(request, &self.settings.defaults);
        let url = self.url("/v1/chat/completions");
        debug!(
            url = %url,
            model = %body["model"],
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending completion request"
        );

        let response = self
            .send(|| self.authorize(self.http.post(&url).json(&body)))
            .await?;
        let json = Self::read_json(response).await?;

        let response = CompletionResponse::from_body(json).map_err(|e| CompletionError::Parse(e.to_string()))?;
        debug!(
            finish_reason = ?response.finish_reason,
            tool_calls = response.tool_calls.len(),
            content = %preview(response.text(), 120),
            "Completion received"
        );
        Ok(response)
    }

    async fn list_models(&self) -> Result<Vec<String>, CompletionError> {
        let url = self.url("/v1/models");
        let response = self.send(|| self.authorize(self.http.get(&url))).await?;
        let json = Self::read_json(response).await?;
        Ok(parse_models(&json))
    }
}
