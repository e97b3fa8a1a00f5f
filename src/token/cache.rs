//! LRU access token cache with per-entry expiry
//!
//! Caches client-credentials tokens so a scenario that asks for the same
//! scopes repeatedly does not hit the token endpoint every time.
//! - Key: the sorted, de-duplicated scope list joined by spaces
//! - Expiry: `expires_in` from the token response minus a safety skew

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

use super::Scope;

/// Cached token with its expiry instant
#[derive(Clone)]
struct CacheEntry {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// LRU cache for access tokens
pub struct TokenCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    /// Subtracted from the server-reported lifetime
    skew: Duration,
}

impl TokenCache {
    /// Create a new token cache
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of scope sets to cache
    /// * `skew_seconds` - Seconds before the reported expiry at which a token is dropped
    pub fn new(capacity: usize, skew_seconds: i64) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
            skew: Duration::seconds(skew_seconds),
        }
    }

    /// Cache key for a scope set; order and duplicates do not matter
    pub fn key(scopes: &[Scope]) -> String {
        let mut names: Vec<&str> = scopes.iter().map(Scope::as_str).collect();
        names.sort_unstable();
        names.dedup();
        names.join(" ")
    }

    /// Get a cached token if it exists and hasn't expired
    pub fn get(&self, scopes: &[Scope]) -> Option<String> {
        let key = Self::key(scopes);
        let mut cache = self.cache.lock();

        if let Some(entry) = cache.get(&key) {
            if Utc::now() < entry.expires_at {
                tracing::trace!(scopes = %key, "Token cache hit");
                return Some(entry.access_token.clone());
            }
            tracing::trace!(scopes = %key, "Token cache entry expired");
            cache.pop(&key);
        }

        None
    }

    /// Insert a token that the server said is valid for `expires_in_secs`
    ///
    /// Tokens whose remaining lifetime after the skew is not positive, or
    /// whose expiry is not representable, are not cached.
    pub fn insert(&self, scopes: &[Scope], access_token: String, expires_in_secs: Option<i64>) {
        let Some(expires_in) = expires_in_secs else {
            return;
        };

        let Some(lifetime) = Duration::try_seconds(expires_in)
            .and_then(|reported| reported.checked_sub(&self.skew))
        else {
            tracing::warn!(expires_in = expires_in, "Token lifetime out of range, not caching");
            return;
        };
        if lifetime <= Duration::zero() {
            return;
        }

        let Some(expires_at) = Utc::now().checked_add_signed(lifetime) else {
            tracing::warn!(expires_in = expires_in, "Token expiry out of range, not caching");
            return;
        };

        let key = Self::key(scopes);
        let entry = CacheEntry {
            access_token,
            expires_at,
        };

        self.cache.lock().put(key.clone(), entry);
        tracing::trace!(scopes = %key, lifetime_secs = lifetime.num_seconds(), "Token cache insert");
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        self.cache.lock().clear();
        tracing::debug!("Token cache cleared");
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}
