//! Tool invocation use case.
//!
//! Routes a [`ToolCall`] to the server that advertised the tool and turns
//! the outcome into a [`ToolResult`].
//!
//! ```text
//! ToolCall.name ──▶ ToolCatalog.get ──▶ ToolRoute{server_id, original_name, transport}
//!                                                  │
//!                                                  ▼
//!                               ToolProvider.call_tool(original_name, args)
//! ```
//!
//! [`ToolInvoker::invoke_many`] never fails as a whole: every error turns
//! into a `ToolResult { ok: false }` at the position of the call that
//! caused it, so one bad call cannot lose the results computed before it.
//! Tool failures are never retried here; the model sees the error and
//! decides what to do next.

use chatloop_domain::core::string::preview;
use chatloop_domain::{ProviderError, ToolCall, ToolResult};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::tool_catalog::{CatalogError, ToolCatalog};

#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Routing metadata missing, or its server is not configured
    #[error("Server misconfigured for tool '{tool}': {reason}")]
    ServerMisconfigured { tool: String, reason: String },

    #[error("Tool '{tool}' failed: {source}")]
    Execution {
        tool: String,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub struct ToolInvoker {
    catalog: Arc<ToolCatalog>,
}

impl ToolInvoker {
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self { catalog }
    }

    /// Execute a single call against its owning server.
    pub async fn invoke(&self, call: &ToolCall) -> Result<ToolResult, InvocationError> {
        let definition = self
            .catalog
            .get(&call.name)
            .await?
            .ok_or_else(|| InvocationError::ToolNotFound(call.name.clone()))?;

        let route = definition
            .route
            .as_ref()
            .ok_or_else(|| InvocationError::ServerMisconfigured {
                tool: call.name.clone(),
                reason: "missing routing metadata".into(),
            })?;

        let provider = self.catalog.provider(&route.server_id).ok_or_else(|| {
            InvocationError::ServerMisconfigured {
                tool: call.name.clone(),
                reason: format!("server '{}' is not configured", route.server_id),
            }
        })?;

        if provider.transport() != route.transport {
            return Err(InvocationError::ServerMisconfigured {
                tool: call.name.clone(),
                reason: format!(
                    "route expects {} but server '{}' is {}",
                    route.transport,
                    route.server_id,
                    provider.transport()
                ),
            });
        }

        if call.arguments.is_parse_failed() {
            warn!(tool = %call.name, "Unparseable tool arguments, invoking with none");
        }
        let missing = definition.missing_required(&call.arguments);
        if !missing.is_empty() {
            debug!(tool = %call.name, ?missing, "Required arguments missing, the server may reject the call");
        }

        info!(
            tool = %call.name,
            server = %route.server_id,
            transport = %route.transport,
            "Invoking tool"
        );

        let arguments = call.arguments.as_map();
        let payload = provider
            .call_tool(&route.original_name, &arguments)
            .await
            .map_err(|source| InvocationError::Execution {
                tool: call.name.clone(),
                source,
            })?;

        debug!(tool = %call.name, result = %preview(&payload.to_string(), 200), "Tool returned");
        Ok(ToolResult::success(call, &payload))
    }

    /// Execute calls one after another, in order, isolating failures.
    ///
    /// Returns exactly one result per call, at the same position.
    pub async fn invoke_many(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let result = match self.invoke(call).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Tool call failed");
                    ToolResult::failure(call, &e)
                }
            };
            results.push(result);
        }
        results
    }

    /// Required schema parameters absent from the call's arguments.
    pub async fn validate_arguments(&self, call: &ToolCall) -> Result<Vec<String>, InvocationError> {
        let definition = self
            .catalog
            .get(&call.name)
            .await?
            .ok_or_else(|| InvocationError::ToolNotFound(call.name.clone()))?;
        Ok(definition.missing_required(&call.arguments))
    }
}
