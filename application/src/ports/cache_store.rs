//! Cache store port
//!
//! Key/value store with per-entry TTL. The tool catalog owns one; it is the
//! only process-wide shared state of the loop, and it is injectable so tests
//! can drive expiry with a fake clock.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Unexpired value under `key`
    async fn get(&self, key: &str) -> Option<Value>;

    async fn put(&self, key: &str, value: Value, ttl: Duration);

    async fn forget(&self, key: &str);
}
