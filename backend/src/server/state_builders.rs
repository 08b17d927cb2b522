//! Builders assembling the HTTP state from concrete adapters.
//!
//! This is the composition root: every service receives its collaborators
//! here, once, by constructor injection. Nothing else in the crate builds
//! adapters or services.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{AccountService, AuthService, CacheService, PaymentService, UserService};
use crate::inbound::http::HttpState;
use crate::outbound::cache::RedisKeyValueCache;
use crate::outbound::persistence::{
    DbPool, DieselAccountRepository, DieselPaymentRepository, DieselUserRepository,
};
use crate::outbound::security::BcryptPasswordHasher;
use crate::outbound::token::JwtTokenCodec;

/// Secrets and lifetimes the services are parameterised with.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Token signing secret.
    pub token_secret: String,
    /// Webhook shared secret.
    pub webhook_secret: String,
    /// Bearer token lifetime.
    pub token_ttl: Duration,
    /// Default cache entry TTL.
    pub cache_ttl: Duration,
}

/// Build the handler state from the database pool, cache adapter, and
/// service configuration.
pub fn build_http_state(
    pool: DbPool,
    cache: RedisKeyValueCache,
    config: ServiceConfig,
) -> HttpState {
    let user_repo = Arc::new(DieselUserRepository::new(pool.clone()));
    let account_repo = Arc::new(DieselAccountRepository::new(pool.clone()));
    let payment_repo = Arc::new(DieselPaymentRepository::new(pool));

    let cache_service = CacheService::new(Arc::new(cache), config.cache_ttl);
    let hasher = Arc::new(BcryptPasswordHasher::new());
    let tokens = Arc::new(JwtTokenCodec::new(&config.token_secret));

    let auth = Arc::new(AuthService::new(
        Arc::clone(&user_repo),
        Arc::clone(&hasher),
        Arc::clone(&tokens),
        config.token_ttl,
    ));
    let users = Arc::new(UserService::new(
        user_repo,
        hasher,
        cache_service.clone(),
    ));
    let accounts = Arc::new(AccountService::new(
        Arc::clone(&account_repo),
        cache_service.clone(),
    ));
    let payments = Arc::new(PaymentService::new(
        payment_repo,
        account_repo,
        cache_service,
        config.webhook_secret,
    ));

    let users_query: Arc<dyn crate::domain::ports::UsersQuery> = users.clone();
    let payment_webhook: Arc<dyn crate::domain::ports::PaymentWebhook> = payments.clone();

    HttpState {
        login: auth,
        users_query,
        users_command: users,
        accounts,
        payment_webhook,
        payments_query: payments,
        tokens,
    }
}
