//! Application settings loaded via OrthoConfig.
//!
//! Values come from the environment (prefix `PAYMENT_`), CLI arguments, or
//! a configuration file, in OrthoConfig's usual precedence. Optional fields
//! fall back through the accessors; the connection strings and secrets have
//! no sensible defaults and are checked at startup.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_TOKEN_TTL_MINUTES: u64 = 30;
const DEFAULT_API_PREFIX: &str = "/api/v1";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// A required setting was not provided by any configuration source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("required setting {name} is not configured (env: PAYMENT_{name_upper})")]
pub struct MissingSetting {
    /// Field name as written in the settings struct.
    pub name: &'static str,
    /// Upper-cased name for the env hint in the message.
    pub name_upper: &'static str,
}

/// Configuration values for the payment-account service.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PAYMENT")]
pub struct AppSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Redis connection string for the cache adapter.
    pub redis_url: Option<String>,
    /// Token signing secret.
    pub secret_key: Option<String>,
    /// Shared secret the payment processor signs webhooks with.
    pub webhook_secret_key: Option<String>,
    /// Bearer token lifetime in minutes.
    pub access_token_expire_minutes: Option<u64>,
    /// Path prefix for the versioned API.
    pub api_prefix: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Default TTL for cache entries, in seconds.
    pub cache_ttl_seconds: Option<u64>,
}

impl AppSettings {
    /// PostgreSQL connection string (required).
    pub fn database_url(&self) -> Result<&str, MissingSetting> {
        self.database_url.as_deref().ok_or(MissingSetting {
            name: "database_url",
            name_upper: "DATABASE_URL",
        })
    }

    /// Redis connection string (required).
    pub fn redis_url(&self) -> Result<&str, MissingSetting> {
        self.redis_url.as_deref().ok_or(MissingSetting {
            name: "redis_url",
            name_upper: "REDIS_URL",
        })
    }

    /// Token signing secret (required).
    pub fn secret_key(&self) -> Result<&str, MissingSetting> {
        self.secret_key.as_deref().ok_or(MissingSetting {
            name: "secret_key",
            name_upper: "SECRET_KEY",
        })
    }

    /// Webhook shared secret (required).
    pub fn webhook_secret_key(&self) -> Result<&str, MissingSetting> {
        self.webhook_secret_key.as_deref().ok_or(MissingSetting {
            name: "webhook_secret_key",
            name_upper: "WEBHOOK_SECRET_KEY",
        })
    }

    /// Bearer token lifetime, defaulting to 30 minutes.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(
            self.access_token_expire_minutes
                .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES)
                * 60,
        )
    }

    /// API path prefix, defaulting to `/api/v1`.
    pub fn api_prefix(&self) -> &str {
        self.api_prefix.as_deref().unwrap_or(DEFAULT_API_PREFIX)
    }

    /// Bind address, defaulting to `0.0.0.0:8000`.
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Default cache entry TTL, defaulting to 300 seconds.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECONDS))
    }
}
