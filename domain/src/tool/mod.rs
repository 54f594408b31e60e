//! Tool domain module
//!
//! Types for the tool-calling side of a conversation: what the model is
//! offered, what it asks for, and what comes back.
//!
//! ```text
//! ┌────────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolDefinition │───▶│ ToolCall     │───▶│ ToolResult   │
//! │ (catalog)      │    │ (requested)  │    │ (outcome)    │
//! └────────────────┘    └──────┬───────┘    └──────────────┘
//!                              │
//!                              └─ CallSignature (loop detection)
//! ```
//!
//! # Key Types
//!
//! - [`ToolDefinition`]: prefixed name, description, parameter schema and
//!   the [`ToolRoute`] the invoker needs to reach the owning server
//! - [`ToolCall`]: a requested invocation with [`ToolArguments`]
//! - [`ToolResult`]: outcome, success or error descriptor
//! - [`CallSignature`]: fingerprints of one turn's call set
//! - [`ToolProvider`] / [`ToolHandler`]: server and in-process tool seams
//!
//! Nothing here performs I/O; providers are implemented in the
//! infrastructure layer.

pub mod arguments;
pub mod entities;
pub mod fingerprint;
pub mod provider;
pub mod value_objects;

pub use arguments::ToolArguments;
pub use entities::{
    DEFAULT_TOOL_DESCRIPTION, ToolCall, ToolDefinition, ToolDescriptor, ToolRoute, Transport,
};
pub use fingerprint::CallSignature;
pub use provider::{ProviderError, ToolHandler, ToolProvider};
pub use value_objects::{ToolError, ToolOutput, ToolResult};
