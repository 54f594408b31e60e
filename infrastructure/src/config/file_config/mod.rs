//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every section has defaults, so an empty file (or no file) is valid.

mod agent;
mod cache;
mod jan;
mod logging;
mod queue;
mod servers;

pub use agent::FileAgentConfig;
pub use cache::{FileCacheConfig, FileErrorHandlingConfig, catalog_policy};
pub use jan::FileJanConfig;
pub use logging::{FileLoggingConfig, FileSessionConfig, expand_home};
pub use queue::FileQueueConfig;
pub use servers::{DEFAULT_SERVER_ID, FileServerConfig, default_servers};

use chatloop_domain::{ConfigIssue, Transport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Completion endpoint
    pub jan: FileJanConfig,
    /// Tool servers keyed by server id
    pub servers: BTreeMap<String, FileServerConfig>,
    /// Tool catalog cache
    pub cache: FileCacheConfig,
    /// Tool server retries and failure policy
    pub error_handling: FileErrorHandlingConfig,
    /// Loop limits and prompts
    pub agent: FileAgentConfig,
    /// Background job queue
    pub queue: FileQueueConfig,
    pub logging: FileLoggingConfig,
    pub session: FileSessionConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            jan: FileJanConfig::default(),
            servers: default_servers(),
            cache: FileCacheConfig::default(),
            error_handling: FileErrorHandlingConfig::default(),
            agent: FileAgentConfig::default(),
            queue: FileQueueConfig::default(),
            logging: FileLoggingConfig::default(),
            session: FileSessionConfig::default(),
        }
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Issues are warnings: every one of them has a fallback (skip the
    /// server, use the default value).
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.jan.url.trim().is_empty() {
            issues.push(ConfigIssue::missing_field(
                "jan.url",
                "jan.url is empty, falling back to http://localhost:1337",
            ));
        }

        for (id, server) in self.enabled_servers() {
            issues.extend(server.transport(id).1);
        }

        issues.extend(self.agent.to_execution_params().1);

        if self.queue.tries == 0 {
            issues.push(ConfigIssue::invalid_value(
                "queue.tries",
                "0",
                "queue.tries must be at least 1, falling back to 1",
            ));
        }

        issues
    }

    pub fn enabled_servers(&self) -> impl Iterator<Item = (&str, &FileServerConfig)> {
        self.servers
            .iter()
            .filter(|(_, server)| server.enabled)
            .map(|(id, server)| (id.as_str(), server))
    }

    /// Enabled servers with a usable transport.
    pub fn resolved_servers(&self) -> Vec<(&str, &FileServerConfig, Transport)> {
        self.enabled_servers()
            .filter_map(|(id, server)| server.transport(id).0.map(|t| (id, server, t)))
            .collect()
    }

    /// Completion endpoint URL with the fallback applied.
    pub fn jan_url(&self) -> String {
        let url = self.jan.url.trim().trim_end_matches('/');
        if url.is_empty() {
            FileJanConfig::default().url
        } else {
            url.to_string()
        }
    }
}
