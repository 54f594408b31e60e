//! Tool servers
//!
//! Concrete [`ToolProvider`]s built from the `[servers]` configuration:
//!
//! - `internal` servers: [`InProcessToolServer`] mounting built-in handlers
//!   (currently [`ReadingsTool`])
//! - `external` servers: [`HttpToolServer`] speaking `/tools/list` and
//!   `/tools/call`

pub mod http_server;
pub mod in_process;
pub mod readings;

pub use http_server::{HttpToolServer, RetryPolicy};
pub use in_process::InProcessToolServer;
pub use readings::{READINGS_TOOL_NAME, Reading, ReadingLog, ReadingQuery, ReadingStatus, ReadingsTool};

use std::sync::Arc;
use std::time::Duration;

use chatloop_domain::{ToolHandler, ToolProvider, Transport};
use tracing::{info, warn};

use crate::config::{FileConfig, FileServerConfig};

/// Names of the handlers an `internal` server can mount.
pub const BUILTIN_HANDLERS: &[&str] = &[READINGS_TOOL_NAME];

/// Shared state behind the built-in handlers.
#[derive(Clone)]
pub struct BuiltinState {
    pub readings: Arc<ReadingLog>,
}

impl BuiltinState {
    pub fn new(readings: ReadingLog) -> Self {
        Self {
            readings: Arc::new(readings),
        }
    }

    /// Built-in handler by name.
    pub fn handler(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        match name {
            READINGS_TOOL_NAME => Some(Arc::new(ReadingsTool::shared(self.readings.clone()))),
            _ => None,
        }
    }
}

impl Default for BuiltinState {
    fn default() -> Self {
        Self::new(ReadingLog::recent())
    }
}

/// Build one provider per enabled, resolvable server, in id order.
///
/// Unusable servers are skipped with a warning; `FileConfig::validate`
/// reports the same problems up front.
pub fn build_providers(config: &FileConfig, builtins: &BuiltinState) -> Vec<Arc<dyn ToolProvider>> {
    let retry = RetryPolicy {
        attempts: config.error_handling.retry_attempts.max(1),
        delay: config.error_handling.retry_delay(),
    };

    let mut providers: Vec<Arc<dyn ToolProvider>> = Vec::new();
    for (id, server, transport) in config.resolved_servers() {
        match transport {
            Transport::InProcess => providers.push(Arc::new(in_process_server(id, server, builtins))),
            Transport::RemoteHttp => {
                let url = server.url.as_deref().unwrap_or_default();
                match HttpToolServer::new(id, url, Duration::from_secs(server.timeout_secs), retry) {
                    Ok(remote) => providers.push(Arc::new(remote)),
                    Err(e) => warn!(server = id, error = %e, "Could not set up tool server, skipped"),
                }
            }
        }
    }

    info!(count = providers.len(), "Tool servers configured");
    providers
}

fn in_process_server(id: &str, server: &FileServerConfig, builtins: &BuiltinState) -> InProcessToolServer {
    let wanted: Vec<&str> = match &server.handlers {
        Some(names) => names.iter().map(String::as_str).collect(),
        None => BUILTIN_HANDLERS.to_vec(),
    };

    wanted.into_iter().fold(InProcessToolServer::new(id), |acc, name| match builtins.handler(name) {
        Some(handler) => acc.register_arc(handler),
        None => {
            warn!(server = id, handler = name, "Unknown built-in handler, ignored");
            acc
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_servers;
    use chrono::NaiveDate;

    fn builtins() -> BuiltinState {
        let end = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
        BuiltinState::new(ReadingLog::sample(10, end))
    }

    #[tokio::test]
    async fn test_default_config_mounts_readings_tool() {
        let providers = build_providers(&FileConfig::default(), &builtins());
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id(), "compressor_ai");
        assert_eq!(providers[0].transport(), Transport::InProcess);

        let tools = providers[0].list_tools().await.unwrap();
        assert_eq!(tools[0].name, "readLatest");
    }

    #[test]
    fn test_mixed_servers_skip_unusable() {
        let mut config = FileConfig::default();
        config.servers = default_servers();
        config.servers.insert(
            "ops".into(),
            FileServerConfig {
                kind: "external".into(),
                url: Some("http://localhost:3001".into()),
                ..Default::default()
            },
        );
        config.servers.insert(
            "nourl".into(),
            FileServerConfig {
                kind: "external".into(),
                ..Default::default()
            },
        );
        config.servers.insert(
            "off".into(),
            FileServerConfig {
                enabled: false,
                ..Default::default()
            },
        );

        let ids: Vec<String> = build_providers(&config, &builtins())
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        assert_eq!(ids, vec!["compressor_ai", "ops"]);
    }

    #[tokio::test]
    async fn test_handler_filter() {
        let server = FileServerConfig {
            handlers: Some(vec!["nope".into()]),
            ..Default::default()
        };
        let built = in_process_server("empty", &server, &builtins());
        assert!(built.is_empty());
        assert!(built.list_tools().await.unwrap().is_empty());
    }
}
