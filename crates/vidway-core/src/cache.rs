//! TTL-bounded response cache and cache key derivation.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

/// Derives a stable cache key from an endpoint and its parameters.
///
/// The endpoint is trimmed and lowercased; parameters arrive in a `BTreeMap`
/// so their iteration order is already canonical. Pairs are fed to SHA-256
/// with unit separators so that no concatenation of keys and values can
/// collide with a different parameter set.
pub fn cache_key(endpoint: &str, params: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(endpoint.trim().to_ascii_lowercase().as_bytes());
    hasher.update([0x1e]);
    for (key, value) in params {
        hasher.update(key.trim().as_bytes());
        hasher.update([0x1f]);
        hasher.update(value.trim().as_bytes());
        hasher.update([0x1e]);
    }
    format!("{:x}", hasher.finalize())
}

struct CacheEntry {
    value: Value,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_valid(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) < self.ttl
    }
}

/// Keyed, TTL-bounded memoization of prior responses.
///
/// Expiry is lazy: expired entries behave as absent and are evicted
/// opportunistically by the read that finds them. Concurrent writes to the
/// same key are last-write-wins.
pub struct ResponseCache {
    default_ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key` if present and unexpired.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_valid(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: evict under the write lock, re-checking validity in case
        // a concurrent put refreshed the entry meanwhile.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.is_valid(now) {
                return Some(entry.value.clone());
            }
            entries.remove(key);
            tracing::debug!(key, "evicted expired cache entry");
        }
        None
    }

    /// Stores `value` under `key`. `ttl` of `None` uses the default.
    pub async fn put(&self, key: impl Into<String>, value: Value, ttl: Option<Duration>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.into(),
            CacheEntry {
                value,
                created_at: Instant::now(),
                ttl: ttl.unwrap_or(self.default_ttl),
            },
        );
    }

    /// Removes `key` regardless of expiry.
    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Drops every expired entry. Lazy expiry makes this optional; it bounds
    /// memory when a caller wants a periodic sweep.
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid(now));
        before - entries.len()
    }

    /// Removes every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, including any not yet evicted expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
