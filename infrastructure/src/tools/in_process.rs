//! In-process tool server
//!
//! An [`InProcessToolServer`] exposes a set of [`ToolHandler`]s as one
//! [`ToolProvider`]. Calls are dispatched directly to the handler with the
//! same original name; no network is involved.
//!
//! ```ignore
//! let server = InProcessToolServer::new("compressor_ai")
//!     .register(ReadingsTool::new(ReadingLog::sample()));
//!
//! // Advertised to the model as "compressor_ai_readLatest"
//! let tools = server.list_tools().await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chatloop_domain::{ProviderError, ToolDescriptor, ToolHandler, ToolProvider, Transport};
use serde_json::{Map, Value};
use tracing::debug;

pub struct InProcessToolServer {
    id: String,
    /// Registration order is advertisement order
    handlers: Vec<Arc<dyn ToolHandler>>,
}

impl InProcessToolServer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handlers: Vec::new(),
        }
    }

    /// Register a handler. A later handler with the same name replaces the earlier one.
    pub fn register<H: ToolHandler + 'static>(self, handler: H) -> Self {
        self.register_arc(Arc::new(handler))
    }

    pub fn register_arc(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.handlers.retain(|h| h.name() != handler.name());
        self.handlers.push(handler);
        self
    }

    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl ToolProvider for InProcessToolServer {
    fn id(&self) -> &str {
        &self.id
    }

    fn transport(&self) -> Transport {
        Transport::InProcess
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        Ok(self.handlers.iter().map(|h| h.descriptor()).collect())
    }

    async fn call_tool(
        &self,
        original_name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Value, ProviderError> {
        let handler = self
            .handlers
            .iter()
            .find(|h| h.name() == original_name)
            .ok_or_else(|| ProviderError::UnknownTool(original_name.to_string()))?;

        debug!(server = %self.id, tool = original_name, "Dispatching to in-process handler");
        let output = handler.handle(arguments).await?;
        Ok(output.into_payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatloop_domain::{ToolError, ToolOutput};
    use serde_json::json;

    struct Fixed {
        name: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl ToolHandler for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Fixed reply"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn handle(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
            if arguments.contains_key("fail") {
                return Err(ToolError::execution_failed("asked to fail"));
            }
            Ok(ToolOutput::text(self.reply))
        }
    }

    fn server() -> InProcessToolServer {
        InProcessToolServer::new("plant")
            .register(Fixed { name: "a", reply: "first" })
            .register(Fixed { name: "b", reply: "second" })
    }

    #[tokio::test]
    async fn test_lists_handlers_in_registration_order() {
        let names: Vec<String> = server().list_tools().await.unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_text_output_wrapped_as_content_block() {
        let payload = server().call_tool("b", &Map::new()).await.unwrap();
        assert_eq!(payload, json!({"content": [{"type": "text", "text": "second"}]}));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = server().call_tool("zzz", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownTool(ref n) if n == "zzz"));
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let mut args = Map::new();
        args.insert("fail".into(), json!(true));
        let err = server().call_tool("a", &args).await.unwrap_err();
        assert!(matches!(err, ProviderError::Handler(_)));
        assert!(err.to_string().contains("asked to fail"));
    }

    #[test]
    fn test_reregistering_replaces() {
        let server = server().register(Fixed { name: "a", reply: "again" });
        assert_eq!(server.handler_names(), vec!["b", "a"]);
    }
}
