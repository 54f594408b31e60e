//! Tool server configuration from TOML (`[servers.<id>]` tables)

use chatloop_domain::{ConfigIssue, Transport, validate_identifier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Id of the built-in server exposing the compressor readings tool.
pub const DEFAULT_SERVER_ID: &str = "compressor_ai";

const SERVER_TYPES: &[&str] = &["internal", "external"];

/// One tool server
///
/// # Example
///
/// ```toml
/// [servers.compressor_ai]
/// name = "Compressor AI"
/// type = "internal"
///
/// [servers.ops]
/// name = "Ops tools"
/// type = "external"
/// url = "http://localhost:3001"
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Display name
    pub name: Option<String>,
    /// `internal` (in-process handlers) or `external` (HTTP)
    #[serde(rename = "type")]
    pub kind: String,
    /// Base URL, required for `external`
    pub url: Option<String>,
    pub enabled: bool,
    pub timeout_secs: u64,
    /// Built-in handlers to mount on an `internal` server (default: all)
    pub handlers: Option<Vec<String>>,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            name: None,
            kind: "internal".to_string(),
            url: None,
            enabled: true,
            timeout_secs: 30,
            handlers: None,
        }
    }
}

impl FileServerConfig {
    /// Resolve the transport, reporting an issue for unusable settings.
    ///
    /// Returns `None` when the server has to be skipped.
    pub fn transport(&self, id: &str) -> (Option<Transport>, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        if let Err(e) = validate_identifier(id) {
            issues.push(ConfigIssue::invalid_value(
                format!("servers.{}", id),
                id,
                format!("{}, server skipped", e),
            ));
            return (None, issues);
        }

        let transport = match self.kind.to_lowercase().as_str() {
            "internal" => Some(Transport::InProcess),
            "external" => match self.url.as_deref().map(str::trim) {
                None | Some("") => {
                    issues.push(ConfigIssue::missing_field(
                        format!("servers.{}.url", id),
                        format!("external server '{}' has no url, server skipped", id),
                    ));
                    None
                }
                Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                    issues.push(ConfigIssue::invalid_value(
                        format!("servers.{}.url", id),
                        url,
                        format!("url of server '{}' must be http(s), server skipped", id),
                    ));
                    None
                }
                Some(_) => Some(Transport::RemoteHttp),
            },
            other => {
                issues.push(ConfigIssue::invalid_enum(
                    format!("servers.{}.type", id),
                    other,
                    SERVER_TYPES,
                    format!("unknown server type '{}', server skipped", other),
                ));
                None
            }
        };

        (transport, issues)
    }
}

/// Servers mounted when the configuration names none.
pub fn default_servers() -> BTreeMap<String, FileServerConfig> {
    let mut servers = BTreeMap::new();
    servers.insert(
        DEFAULT_SERVER_ID.to_string(),
        FileServerConfig {
            name: Some("Compressor AI".to_string()),
            ..Default::default()
        },
    );
    servers
}
