use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::Resource;
use crate::cache_store::CacheStore;
use crate::config::{Config, DEFAULT_CACHE_NAMESPACE, DEFAULT_CACHE_TTL};
use crate::fetcher::Fetcher;
use crate::state::ResourceResult;

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    data: Value,
    timestamp: i64,
}

/// TTL cache over a `CacheStore`. Expiry is lazy: a stale entry is only
/// dropped when someone reads it.
pub struct ExpiringCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    namespace: String,
}

impl ExpiringCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_CACHE_TTL,
            namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
        }
    }

    pub fn from_config(store: Arc<dyn CacheStore>, config: &Config) -> Self {
        Self::new(store)
            .with_ttl(config.cache_ttl)
            .with_namespace(config.cache_namespace.clone())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// One key per (resource, username); the namespace is added on access.
    pub fn cache_key(resource: Resource, username: &str) -> String {
        format!("{}_{username}", resource.key())
    }

    fn store_key(&self, key: &str) -> String {
        format!("{}{key}", self.namespace)
    }

    pub fn get_cached(&self, key: &str) -> Option<Value> {
        let store_key = self.store_key(key);
        let raw = match self.store.get(&store_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                debug!(key = %store_key, error = %err, "cache read failed");
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(key = %store_key, error = %err, "undecodable cache entry");
                return None;
            }
        };
        let age = self.clock.now_millis() - entry.timestamp;
        if age > self.ttl.as_millis() as i64 {
            debug!(key = %store_key, age_ms = age, "cache entry expired");
            if let Err(err) = self.store.remove(&store_key) {
                debug!(key = %store_key, error = %err, "failed to drop expired entry");
            }
            return None;
        }
        Some(entry.data)
    }

    /// Best-effort write; failures are logged and otherwise ignored.
    pub fn set_cached(&self, key: &str, data: &Value) {
        let store_key = self.store_key(key);
        let entry = CacheEntry {
            data: data.clone(),
            timestamp: self.clock.now_millis(),
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(key = %store_key, error = %err, "cache entry not serializable");
                return;
            }
        };
        if let Err(err) = self.store.set(&store_key, &raw) {
            debug!(key = %store_key, error = %err, "cache write failed");
        }
    }

    pub fn fetch_with_caching(
        &self,
        fetcher: &Fetcher,
        url: &str,
        context: &str,
        key: &str,
    ) -> ResourceResult {
        if let Some(data) = self.get_cached(key) {
            return ResourceResult::from_cache(data);
        }
        match fetcher.fetch_json(url, context) {
            Ok(data) => {
                self.set_cached(key, &data);
                ResourceResult::fresh(data)
            }
            Err(err) => ResourceResult::failed(err.to_string()),
        }
    }
}
