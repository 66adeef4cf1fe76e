//! Process-local map from logical mutation to idempotency key.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::Value;
use url::Url;

use crate::domain::idempotency::{
    IdempotencyConfig, IdempotencyKey, PayloadHash, PayloadHashError, canonicalize_and_hash,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    url: String,
    payload: PayloadHash,
}

#[derive(Debug, Clone)]
struct CachedKey {
    key: IdempotencyKey,
    created_at: DateTime<Utc>,
}

/// Keys minted for `(url, body)` pairs, each reused until its TTL elapses.
///
/// Entries expire individually and are pruned whenever the cache is
/// consulted. Nothing is persisted across restarts.
#[derive(Debug)]
pub struct IdempotencyCache {
    config: IdempotencyConfig,
    entries: Mutex<HashMap<CacheKey, CachedKey>>,
}

impl IdempotencyCache {
    pub fn new(config: IdempotencyConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Key for `(url, body)` at `now`, minting one if none is live.
    ///
    /// # Errors
    ///
    /// Returns an error when the body cannot be canonicalised.
    pub fn key_for(
        &self,
        url: &Url,
        body: &Value,
        now: DateTime<Utc>,
    ) -> Result<IdempotencyKey, PayloadHashError> {
        let cache_key = CacheKey {
            url: url.as_str().to_owned(),
            payload: canonicalize_and_hash(body)?,
        };
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, cached| !self.is_expired(cached, now));
        let cached = entries.entry(cache_key).or_insert_with(|| CachedKey {
            key: IdempotencyKey::generate(),
            created_at: now,
        });
        Ok(cached.key.clone())
    }

    /// Number of live or not yet pruned entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, cached: &CachedKey, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(cached.created_at)
            .to_std()
            .is_ok_and(|age| self.config.has_lapsed(age))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 16, 9, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://api.example.test{path}")).expect("url")
    }

    #[rstest]
    fn same_mutation_within_ttl_reuses_the_key(now: DateTime<Utc>) {
        let cache = IdempotencyCache::new(IdempotencyConfig::default());
        let body = json!({"amountMinor": 7550, "category": "Food"});
        let reordered = json!({"category": "Food", "amountMinor": 7550});

        let first = cache.key_for(&url("/users/u1/transactions"), &body, now).expect("key");
        let later = now + chrono::TimeDelta::hours(23);
        let second = cache
            .key_for(&url("/users/u1/transactions"), &reordered, later)
            .expect("key");

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[rstest]
    fn key_is_replaced_once_the_ttl_elapses(now: DateTime<Utc>) {
        let cache = IdempotencyCache::new(IdempotencyConfig::default());
        let body = json!({"amountMinor": 7550});
        let first = cache.key_for(&url("/users/u1/transactions"), &body, now).expect("key");

        let expired = now + chrono::TimeDelta::hours(24);
        let second = cache
            .key_for(&url("/users/u1/transactions"), &body, expired)
            .expect("key");

        assert_ne!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[rstest]
    fn different_endpoints_or_bodies_get_different_keys(now: DateTime<Utc>) {
        let cache = IdempotencyCache::new(IdempotencyConfig::default());
        let a = cache
            .key_for(&url("/users/u1/transactions"), &json!({"n": 1}), now)
            .expect("key");
        let b = cache
            .key_for(&url("/users/u2/transactions"), &json!({"n": 1}), now)
            .expect("key");
        let c = cache
            .key_for(&url("/users/u1/transactions"), &json!({"n": 2}), now)
            .expect("key");

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(cache.len(), 3);
    }

    #[rstest]
    fn expired_entries_are_pruned_on_access(now: DateTime<Utc>) {
        let cache = IdempotencyCache::new(IdempotencyConfig::from_hours(Some(1)));
        cache
            .key_for(&url("/a"), &json!({}), now)
            .expect("key");
        cache
            .key_for(&url("/b"), &json!({}), now)
            .expect("key");
        assert_eq!(cache.len(), 2);

        cache
            .key_for(&url("/c"), &json!({}), now + chrono::TimeDelta::hours(2))
            .expect("key");
        assert_eq!(cache.len(), 1);
    }
}
