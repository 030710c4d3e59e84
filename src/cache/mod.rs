pub mod keys;

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

const TTL_JITTER_RATIO: f64 = 0.1;

/// Read-through store for computed reports.
///
/// Implementations must be safe to share between in-flight requests; a racing
/// writer simply overwrites the previous entry.
#[async_trait]
pub trait ScoreCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value, ttl: Duration);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// In-memory cache with per-entry expiry, evicted lazily on read
#[derive(Debug, Default)]
pub struct InMemoryScoreCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryScoreCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drops every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl ScoreCache for InMemoryScoreCache {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Option<Value> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        debug!(key, "Evicting expired cache entry");
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(key);
        }
        None
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }

        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + apply_ttl_jitter(ttl),
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }
}

fn apply_ttl_jitter(ttl: Duration) -> Duration {
    let base_ms = ttl.as_millis() as f64;
    let mut rng = rand::rng();
    let factor = rng.random_range(1.0 - TTL_JITTER_RATIO..=1.0 + TTL_JITTER_RATIO);
    let jittered_ms = (base_ms * factor).round().max(1.0);
    Duration::from_millis(jittered_ms as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn returns_stored_value_before_expiry() {
        let cache = InMemoryScoreCache::new();
        cache
            .set("score:fatigue:p-1", json!({"value": 0.4}), Duration::from_secs(60))
            .await;

        assert_eq!(
            cache.get("score:fatigue:p-1").await,
            Some(json!({"value": 0.4}))
        );
        assert!(cache.get("score:fatigue:p-2").await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_evicted_on_read() {
        let cache = InMemoryScoreCache::new();
        cache.set("k", json!(1), Duration::from_millis(5)).await;

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.get("k").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn zero_ttl_is_not_stored() {
        let cache = InMemoryScoreCache::new();
        cache.set("k", json!(1), Duration::ZERO).await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let cache = InMemoryScoreCache::new();
        cache.set("short", json!(1), Duration::from_millis(5)).await;
        cache.set("long", json!(2), Duration::from_secs(60)).await;

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.get("long").await, Some(json!(2)));
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        for _ in 0..100 {
            let jittered = apply_ttl_jitter(Duration::from_secs(100));
            assert!(jittered >= Duration::from_secs(90));
            assert!(jittered <= Duration::from_secs(110));
        }
    }
}
