//! Redis cache adapter over `bb8-redis`.
//!
//! Implements the domain's `KeyValueCache` port with `GET`/`SETEX`/`DEL`.
//! Writes apply a small TTL jitter so entries populated in the same burst
//! do not expire in the same instant.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;
use bb8_redis::{RedisConnectionManager, bb8};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::domain::ports::{CacheError, CacheKey, KeyValueCache};

/// Minimum TTL, in seconds, before jitter is applied at all.
const JITTER_THRESHOLD_SECS: u64 = 10;

/// Redis-backed implementation of the `KeyValueCache` port.
#[derive(Clone)]
pub struct RedisKeyValueCache {
    pool: bb8::Pool<RedisConnectionManager>,
}

impl RedisKeyValueCache {
    /// Connect to Redis and build the connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the URL does not parse or the
    /// pool cannot be built.
    pub async fn connect(url: &str, max_size: u32) -> Result<Self, CacheError> {
        let manager = RedisConnectionManager::new(url)
            .map_err(|err| CacheError::backend(err.to_string()))?;
        let pool = bb8::Pool::builder()
            .max_size(max_size)
            .build(manager)
            .await
            .map_err(|err| CacheError::backend(err.to_string()))?;
        Ok(Self { pool })
    }

    /// TTL in whole seconds with up to 10% jitter added.
    ///
    /// Sub-[`JITTER_THRESHOLD_SECS`] TTLs pass through unchanged; jittering
    /// them would distort short-lived entries more than it spreads expiry.
    fn jittered_secs(ttl: Duration) -> u64 {
        let base = ttl.as_secs().max(1);
        if base < JITTER_THRESHOLD_SECS {
            return base;
        }
        let mut rng = SmallRng::from_entropy();
        base + rng.gen_range(0..=base / 10)
    }
}

#[async_trait]
impl KeyValueCache for RedisKeyValueCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| CacheError::backend(err.to_string()))?;
        conn.get::<_, Option<String>>(key.as_str())
            .await
            .map_err(|err| CacheError::backend(err.to_string()))
    }

    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| CacheError::backend(err.to_string()))?;
        conn.set_ex::<_, _, ()>(key.as_str(), value, Self::jittered_secs(ttl))
            .await
            .map_err(|err| CacheError::backend(err.to_string()))
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| CacheError::backend(err.to_string()))?;
        conn.del::<_, ()>(key.as_str())
            .await
            .map_err(|err| CacheError::backend(err.to_string()))
    }
}
