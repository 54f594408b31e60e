//! Remote tool server over HTTP
//!
//! Talks the two-endpoint protocol of an external MCP-style server:
//!
//! ```text
//! GET  {url}/tools/list  ──▶ {"tools": [{"name", "description", "inputSchema"}, ...]}
//! POST {url}/tools/call  ◀── {"name": <original name>, "arguments": {...}}
//!                        ──▶ <result payload, passed through as-is>
//! ```
//!
//! Both requests share a per-server timeout and are retried with a constant
//! delay when the server is unreachable or answers with a non-2xx status.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ConstantBuilder, Retryable};
use chatloop_domain::{ProviderError, ToolDescriptor, ToolProvider, Transport};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

/// Retry behavior for remote tool requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, including the first
    pub attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

pub struct HttpToolServer {
    id: String,
    base_url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpToolServer {
    pub fn new(
        id: impl Into<String>,
        url: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;
        Ok(Self {
            id: id.into(),
            base_url: url.trim_end_matches('/').to_string(),
            http,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request<F>(&self, build: F) -> Result<Value, ProviderError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let strategy = ConstantBuilder::default()
            .with_delay(self.retry.delay)
            .with_max_times(self.retry.attempts.saturating_sub(1));

        (|| async { Self::attempt(build()).await })
            .retry(strategy)
            .when(is_retryable)
            .notify(|e: &ProviderError, delay: Duration| {
                warn!(server = %self.id, error = %e, ?delay, "Tool server request failed, retrying");
            })
            .await
    }

    async fn attempt(builder: reqwest::RequestBuilder) -> Result<Value, ProviderError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

fn is_retryable(e: &ProviderError) -> bool {
    matches!(e, ProviderError::Unreachable(_) | ProviderError::BadStatus { .. })
}

#[async_trait]
impl ToolProvider for HttpToolServer {
    fn id(&self) -> &str {
        &self.id
    }

    fn transport(&self) -> Transport {
        Transport::RemoteHttp
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        let url = self.url("/tools/list");
        info!(server = %self.id, url = %url, "Fetching tools from remote server");

        let body = self.request(|| self.http.get(&url)).await?;
        let Some(entries) = body.get("tools") else {
            return Ok(Vec::new());
        };
        let entries = entries
            .as_array()
            .ok_or_else(|| ProviderError::InvalidResponse("'tools' is not an array".into()))?;

        let mut tools = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<ToolDescriptor>(entry.clone()) {
                Ok(descriptor) => tools.push(descriptor),
                Err(e) => warn!(server = %self.id, error = %e, "Skipping undecodable tool entry"),
            }
        }
        Ok(tools)
    }

    async fn call_tool(
        &self,
        original_name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Value, ProviderError> {
        let url = self.url("/tools/call");
        let body = json!({ "name": original_name, "arguments": arguments });
        debug!(server = %self.id, tool = original_name, url = %url, "Calling remote tool");

        self.request(|| self.http.post(&url).json(&body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn server_for(mock: &mockito::ServerGuard, attempts: usize) -> HttpToolServer {
        let retry = RetryPolicy {
            attempts,
            delay: Duration::from_millis(1),
        };
        HttpToolServer::new("plant", &format!("{}/", mock.url()), Duration::from_secs(5), retry).unwrap()
    }

    #[tokio::test]
    async fn test_list_tools_decodes_descriptors() {
        let mut mock = mockito::Server::new_async().await;
        let list = mock
            .mock("GET", "/tools/list")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"tools": [
                    {"name": "readLatest", "description": "Latest readings",
                     "inputSchema": {"type": "object", "properties": {"limit": {"type": "integer"}}}},
                    {"description": "no name"},
                    {"name": "restart"}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let tools = server_for(&mock, 1).list_tools().await.unwrap();
        list.assert_async().await;

        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "readLatest");
        assert_eq!(tools[0].input_schema.as_ref().unwrap()["properties"]["limit"]["type"], "integer");
        assert_eq!(tools[1].name, "restart");
        assert!(tools[1].description.is_none());
    }

    #[tokio::test]
    async fn test_list_tools_missing_key_is_empty() {
        let mut mock = mockito::Server::new_async().await;
        mock.mock("GET", "/tools/list")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        assert!(server_for(&mock, 1).list_tools().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_call_tool_posts_original_name() {
        let mut mock = mockito::Server::new_async().await;
        let call = mock
            .mock("POST", "/tools/call")
            .match_body(Matcher::Json(json!({"name": "readLatest", "arguments": {"limit": 5}})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"content": [{"type": "text", "text": "ok"}]}).to_string())
            .create_async()
            .await;

        let mut args = Map::new();
        args.insert("limit".into(), json!(5));
        let payload = server_for(&mock, 1).call_tool("readLatest", &args).await.unwrap();

        call.assert_async().await;
        assert_eq!(payload["content"][0]["text"], "ok");
    }

    #[tokio::test]
    async fn test_bad_status_retried_then_reported() {
        let mut mock = mockito::Server::new_async().await;
        let call = mock
            .mock("POST", "/tools/call")
            .with_status(500)
            .with_body("boom")
            .expect(3)
            .create_async()
            .await;

        let err = server_for(&mock, 3).call_tool("readLatest", &Map::new()).await.unwrap_err();

        call.assert_async().await;
        assert!(matches!(err, ProviderError::BadStatus { status: 500, ref body } if body == "boom"));
        assert_eq!(err.to_string(), "Tool execution failed with status 500: boom");
    }

    #[tokio::test]
    async fn test_invalid_json_not_retried() {
        let mut mock = mockito::Server::new_async().await;
        let call = mock
            .mock("POST", "/tools/call")
            .with_status(200)
            .with_body("not json")
            .expect(1)
            .create_async()
            .await;

        let err = server_for(&mock, 3).call_tool("readLatest", &Map::new()).await.unwrap_err();

        call.assert_async().await;
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let retry = RetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(1),
        };
        let server = HttpToolServer::new("down", "http://127.0.0.1:9", Duration::from_secs(2), retry).unwrap();

        let err = server.list_tools().await.unwrap_err();
        assert!(matches!(err, ProviderError::Unreachable(_)));
        assert_eq!(server.transport(), Transport::RemoteHttp);
    }
}
