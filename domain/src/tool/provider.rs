//! Tool provider abstraction
//!
//! A [`ToolProvider`] is one configured tool server. The catalog asks every
//! enabled provider for its tools, and the invoker routes calls back to the
//! provider that advertised them.
//!
//! ```text
//!             ┌───────────────────────────────┐
//!             │          ToolCatalog          │
//!             │ (prefixes names, caches list) │
//!             └───────────────────────────────┘
//!                  │                     │
//!                  ▼                     ▼
//!         ┌────────────────┐    ┌────────────────┐
//!         │ InProcess      │    │ RemoteHttp     │
//!         │ (ToolHandlers) │    │ (/tools/list,  │
//!         │                │    │  /tools/call)  │
//!         └────────────────┘    └────────────────┘
//! ```
//!
//! In-process servers are built from [`ToolHandler`]s, each one a single
//! locally registered tool addressed by its original (unprefixed) name.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::entities::{ToolDescriptor, Transport};
use super::value_objects::{ToolError, ToolOutput};

/// Error type for tool provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure (connect, timeout, reset)
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    /// Server answered with a non-2xx status
    #[error("Tool execution failed with status {status}: {body}")]
    BadStatus { status: u16, body: String },

    /// Server answered 2xx but the body was not what we expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The provider does not know the requested tool
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    /// An in-process handler returned an error
    #[error("{0}")]
    Handler(#[from] ToolError),
}

/// One tool-providing server.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Server id, used as the tool name prefix (e.g. "sensor")
    fn id(&self) -> &str;

    fn transport(&self) -> Transport;

    /// Tools this server currently offers
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError>;

    /// Execute a tool by its original name
    async fn call_tool(
        &self,
        original_name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Value, ProviderError>;
}

/// A locally registered tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON-schema of the arguments object
    fn input_schema(&self) -> Value;

    async fn handle(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name())
            .with_description(self.description())
            .with_input_schema(self.input_schema())
    }
}
