//! JSON cache layer on top of the raw key-value port.
//!
//! The cache is advisory. Reads fall through to storage on a miss or on any
//! cache fault; writes that change underlying data invalidate the affected
//! keys through the table in [`cache_keys`](super::cache_keys). Faults are
//! logged and swallowed so the cache can never mask a storage result.
//!
//! Values serialise losslessly to JSON text: fixed-point decimals as exact
//! decimal strings and timestamps as RFC 3339, both via the domain types'
//! serde implementations.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::cache_keys::{WriteOp, stale_keys};
use super::ports::{CacheKey, KeyValueCache};

/// Serialising cache facade shared by the services.
pub struct CacheService<C> {
    cache: Arc<C>,
    default_ttl: Duration,
}

impl<C> Clone for CacheService<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            default_ttl: self.default_ttl,
        }
    }
}

impl<C> CacheService<C>
where
    C: KeyValueCache,
{
    /// Create a facade over the raw cache with the configured default TTL.
    pub fn new(cache: Arc<C>, default_ttl: Duration) -> Self {
        Self { cache, default_ttl }
    }

    /// Read and deserialise a cached value.
    ///
    /// Returns `None` on a miss, on a backend fault, or when the stored
    /// text no longer decodes; all three mean "go to storage".
    pub async fn get_json<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let raw = match self.cache.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key, error = %err, "cache read failed; falling through");
                return None;
            }
        };

        let Some(raw) = raw else {
            debug!(key = %key, "cache miss");
            return None;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key = %key, "cache hit");
                Some(value)
            }
            Err(err) => {
                warn!(key = %key, error = %err, "cached value failed to decode; ignoring");
                None
            }
        }
    }

    /// Serialise and store a value under the key with the default TTL.
    ///
    /// Best-effort: failures are logged, never returned, so a cache outage
    /// cannot fail a write path whose storage commit already succeeded.
    pub async fn set_json<T>(&self, key: &CacheKey, value: &T)
    where
        T: Serialize,
    {
        let serialized = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(err) => {
                warn!(key = %key, error = %err, "cache serialisation failed; skipping set");
                return;
            }
        };

        if let Err(err) = self.cache.set(key, &serialized, self.default_ttl).await {
            warn!(key = %key, error = %err, "cache set failed; entry not populated");
        } else {
            debug!(key = %key, ttl_secs = self.default_ttl.as_secs(), "cache set");
        }
    }

    /// Delete every cache entry the write operation made stale.
    ///
    /// Best-effort like [`Self::set_json`]; TTL bounds any staleness a
    /// failed delete leaves behind.
    pub async fn invalidate(&self, op: WriteOp) {
        for key in stale_keys(op) {
            if let Err(err) = self.cache.delete(&key).await {
                warn!(key = %key, error = %err, "cache invalidation failed");
            } else {
                debug!(key = %key, "cache invalidated");
            }
        }
    }
}
