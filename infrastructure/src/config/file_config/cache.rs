//! Tool catalog configuration from TOML (`[cache]` and `[error_handling]` sections)

use chatloop_application::CatalogPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw tool cache configuration
///
/// ```toml
/// [cache]
/// enabled = true
/// ttl_secs = 3600      # 0 disables caching
/// key_prefix = "mcp_tools_"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub key_prefix: String,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            key_prefix: "mcp_tools_".to_string(),
        }
    }
}

/// Raw tool server error handling configuration
///
/// ```toml
/// [error_handling]
/// retry_attempts = 3     # remote tool servers
/// retry_delay_ms = 1000
/// fail_silently = false  # true: a broken server contributes no tools
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileErrorHandlingConfig {
    pub retry_attempts: usize,
    pub retry_delay_ms: u64,
    pub fail_silently: bool,
}

impl Default for FileErrorHandlingConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_ms: 1000,
            fail_silently: false,
        }
    }
}

impl FileErrorHandlingConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Combine both sections into the catalog policy.
pub fn catalog_policy(cache: &FileCacheConfig, errors: &FileErrorHandlingConfig) -> CatalogPolicy {
    CatalogPolicy {
        cache_enabled: cache.enabled,
        cache_ttl: Duration::from_secs(cache.ttl_secs),
        key_prefix: cache.key_prefix.clone(),
        fail_silently: errors.fail_silently,
    }
}
