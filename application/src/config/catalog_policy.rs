//! Tool catalog caching and failure policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controls how [`ToolCatalog`](crate::use_cases::tool_catalog::ToolCatalog)
/// caches the tool list and reacts to unreachable servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPolicy {
    /// Cache the merged tool list. A zero TTL also disables caching.
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    /// Cache key is `{key_prefix}all`.
    pub key_prefix: String,
    /// When true, a failing server contributes zero tools instead of
    /// failing the whole listing.
    pub fail_silently: bool,
}

impl Default for CatalogPolicy {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: Duration::from_secs(3600),
            key_prefix: "mcp_tools_".to_string(),
            fail_silently: false,
        }
    }
}

impl CatalogPolicy {
    pub fn cache_key(&self) -> String {
        format!("{}all", self.key_prefix)
    }

    pub fn caching(&self) -> bool {
        self.cache_enabled && !self.cache_ttl.is_zero()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_fail_silently(mut self, fail_silently: bool) -> Self {
        self.fail_silently = fail_silently;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_key_and_ttl() {
        let policy = CatalogPolicy::default();
        assert_eq!(policy.cache_key(), "mcp_tools_all");
        assert_eq!(policy.cache_ttl, Duration::from_secs(3600));
        assert!(policy.caching());
        assert!(!policy.fail_silently);
    }

    #[test]
    fn test_zero_ttl_disables_caching() {
        assert!(!CatalogPolicy::default().with_ttl(Duration::ZERO).caching());
        assert!(!CatalogPolicy::default().without_cache().caching());
    }
}
