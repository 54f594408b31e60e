//! Tool catalog use case.
//!
//! Merges the tools of every configured server into one list of
//! [`ToolDefinition`]s with globally unique, server-prefixed names, and
//! caches the result in a [`CacheStore`] under `{prefix}all`.
//!
//! The cache is a pure optimization: staleness is bounded by the TTL and by
//! [`ToolCatalog::invalidate`]. Concurrent runs share one catalog; a refresh
//! simply overwrites the cached entry.

use chatloop_domain::{ProviderError, ToolDefinition, ToolProvider};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CatalogPolicy;
use crate::ports::cache_store::CacheStore;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to fetch tools from server '{server}': {source}")]
    FetchFailed {
        server: String,
        #[source]
        source: ProviderError,
    },
}

pub struct ToolCatalog {
    providers: Vec<Arc<dyn ToolProvider>>,
    cache: Arc<dyn CacheStore>,
    policy: CatalogPolicy,
}

impl ToolCatalog {
    pub fn new(
        providers: Vec<Arc<dyn ToolProvider>>,
        cache: Arc<dyn CacheStore>,
        policy: CatalogPolicy,
    ) -> Self {
        Self {
            providers,
            cache,
            policy,
        }
    }

    pub fn policy(&self) -> &CatalogPolicy {
        &self.policy
    }

    pub fn providers(&self) -> &[Arc<dyn ToolProvider>] {
        &self.providers
    }

    /// Provider registered under `server_id`.
    pub fn provider(&self, server_id: &str) -> Option<&Arc<dyn ToolProvider>> {
        self.providers.iter().find(|p| p.id() == server_id)
    }

    /// Every tool of every server, served from cache when possible.
    pub async fn list_all(&self) -> Result<Vec<ToolDefinition>, CatalogError> {
        let key = self.policy.cache_key();

        if self.policy.caching()
            && let Some(cached) = self.cache.get(&key).await
        {
            match serde_json::from_value::<Vec<ToolDefinition>>(cached) {
                Ok(tools) => {
                    debug!(count = tools.len(), "Tool catalog served from cache");
                    return Ok(tools);
                }
                Err(e) => warn!(error = %e, "Discarding unreadable tool catalog cache entry"),
            }
        }

        let tools = self.fetch().await?;

        if self.policy.caching() {
            match serde_json::to_value(&tools) {
                Ok(value) => self.cache.put(&key, value, self.policy.cache_ttl).await,
                Err(e) => warn!(error = %e, "Could not serialize tool catalog for caching"),
            }
        }

        Ok(tools)
    }

    /// Look up a tool by its prefixed name.
    pub async fn get(&self, name: &str) -> Result<Option<ToolDefinition>, CatalogError> {
        Ok(self.list_all().await?.into_iter().find(|t| t.name == name))
    }

    /// Tools in the `{type: "function", function: {...}}` shape offered to the model.
    pub async fn function_schemas(&self) -> Result<Vec<Value>, CatalogError> {
        Ok(self
            .list_all()
            .await?
            .iter()
            .map(ToolDefinition::to_function_schema)
            .collect())
    }

    /// Drop the cached list; the next `list_all` re-fetches.
    pub async fn invalidate(&self) {
        self.cache.forget(&self.policy.cache_key()).await;
        info!("Tool catalog cache cleared");
    }

    async fn fetch(&self) -> Result<Vec<ToolDefinition>, CatalogError> {
        let mut tools = Vec::new();
        let mut seen = HashSet::new();

        for provider in &self.providers {
            let server = provider.id();
            match provider.list_tools().await {
                Ok(descriptors) => {
                    debug!(server, count = descriptors.len(), "Discovered tools");
                    for descriptor in descriptors {
                        if descriptor.name.trim().is_empty() {
                            warn!(server, "Skipping tool without a name");
                            continue;
                        }
                        let def = ToolDefinition::from_descriptor(server, provider.transport(), descriptor);
                        if !seen.insert(def.name.clone()) {
                            warn!(server, tool = %def.name, "Skipping duplicate tool name");
                            continue;
                        }
                        tools.push(def);
                    }
                }
                Err(source) if self.policy.fail_silently => {
                    warn!(server, error = %source, "Tool server unavailable, it contributes no tools");
                }
                Err(source) => {
                    return Err(CatalogError::FetchFailed {
                        server: server.to_string(),
                        source,
                    });
                }
            }
        }

        info!(count = tools.len(), servers = self.providers.len(), "Tool catalog refreshed");
        Ok(tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{MemoryCache, StaticProvider};
    use chatloop_domain::Transport;
    use std::time::Duration;

    fn catalog(providers: Vec<Arc<StaticProvider>>, policy: CatalogPolicy) -> (ToolCatalog, Arc<MemoryCache>) {
        let providers = providers
            .into_iter()
            .map(|p| p as Arc<dyn ToolProvider>)
            .collect();
        let cache = Arc::new(MemoryCache::default());
        (ToolCatalog::new(providers, cache.clone(), policy), cache)
    }

    #[tokio::test]
    async fn test_list_all_prefixes_names() {
        let sensor = Arc::new(StaticProvider::new("sensor", Transport::InProcess, &["readLatest"]));
        let ops = Arc::new(StaticProvider::new("ops", Transport::RemoteHttp, &["readLatest", "restart"]));
        let (catalog, _) = catalog(vec![sensor, ops], CatalogPolicy::default());

        let names: Vec<String> = catalog.list_all().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["sensor_readLatest", "ops_readLatest", "ops_restart"]);
    }

    #[tokio::test]
    async fn test_cache_hits_provider_once_until_invalidated() {
        let sensor = Arc::new(StaticProvider::new("sensor", Transport::InProcess, &["readLatest"]));
        let (catalog, cache) = catalog(vec![sensor.clone()], CatalogPolicy::default());

        catalog.list_all().await.unwrap();
        catalog.list_all().await.unwrap();
        assert_eq!(sensor.list_calls(), 1);
        assert!(cache.contains("mcp_tools_all"));

        catalog.invalidate().await;
        assert!(!cache.contains("mcp_tools_all"));
        catalog.list_all().await.unwrap();
        assert_eq!(sensor.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_ttl_passed_to_cache() {
        let sensor = Arc::new(StaticProvider::new("sensor", Transport::InProcess, &["readLatest"]));
        let policy = CatalogPolicy::default().with_ttl(Duration::from_secs(60));
        let (catalog, cache) = catalog(vec![sensor], policy);

        catalog.list_all().await.unwrap();
        assert_eq!(cache.ttl_of("mcp_tools_all"), Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_caching_disabled_always_fetches() {
        let sensor = Arc::new(StaticProvider::new("sensor", Transport::InProcess, &["readLatest"]));
        let (catalog, cache) = catalog(vec![sensor.clone()], CatalogPolicy::default().without_cache());

        catalog.list_all().await.unwrap();
        catalog.list_all().await.unwrap();
        assert_eq!(sensor.list_calls(), 2);
        assert!(!cache.contains("mcp_tools_all"));
    }

    #[tokio::test]
    async fn test_fail_silently_skips_broken_server() {
        let broken = Arc::new(StaticProvider::failing("broken", Transport::RemoteHttp));
        let sensor = Arc::new(StaticProvider::new("sensor", Transport::InProcess, &["readLatest"]));
        let (catalog, _) = catalog(vec![broken, sensor], CatalogPolicy::default().with_fail_silently(true));

        let tools = catalog.list_all().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "sensor_readLatest");
    }

    #[tokio::test]
    async fn test_strict_policy_propagates_first_failure() {
        let broken = Arc::new(StaticProvider::failing("broken", Transport::RemoteHttp));
        let sensor = Arc::new(StaticProvider::new("sensor", Transport::InProcess, &["readLatest"]));
        let (catalog, cache) = catalog(vec![broken, sensor.clone()], CatalogPolicy::default());

        let err = catalog.list_all().await.unwrap_err();
        assert!(matches!(err, CatalogError::FetchFailed { ref server, .. } if server == "broken"));
        assert_eq!(sensor.list_calls(), 0);
        assert!(!cache.contains("mcp_tools_all"));
    }

    #[tokio::test]
    async fn test_get_by_prefixed_name() {
        let sensor = Arc::new(StaticProvider::new("sensor", Transport::InProcess, &["readLatest"]));
        let (catalog, _) = catalog(vec![sensor], CatalogPolicy::default());

        let def = catalog.get("sensor_readLatest").await.unwrap().unwrap();
        assert_eq!(def.route.unwrap().original_name, "readLatest");
        assert!(catalog.get("readLatest").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_cache_entry_refetches() {
        let sensor = Arc::new(StaticProvider::new("sensor", Transport::InProcess, &["readLatest"]));
        let (catalog, cache) = catalog(vec![sensor.clone()], CatalogPolicy::default());
        cache.put("mcp_tools_all", serde_json::json!({"not": "a list"}), Duration::from_secs(5)).await;

        let tools = catalog.list_all().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(sensor.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_function_schemas_hide_routing() {
        let sensor = Arc::new(StaticProvider::new("sensor", Transport::InProcess, &["readLatest"]));
        let (catalog, _) = catalog(vec![sensor], CatalogPolicy::default());

        let schemas = catalog.function_schemas().await.unwrap();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0]["type"], "function");
        assert_eq!(schemas[0]["function"]["name"], "sensor_readLatest");
        assert!(schemas[0].get("route").is_none());
        assert!(schemas[0]["function"].get("route").is_none());
    }
}
