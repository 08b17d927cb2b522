//! Server construction, route wiring, and startup.

mod state_builders;

pub use state_builders::{ServiceConfig, build_http_state};

use actix_web::{App, HttpServer, web};
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppSettings;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::accounts::get_user_accounts;
use crate::inbound::http::auth::issue_token;
use crate::inbound::http::health::health_check;
use crate::inbound::http::payments::{get_user_payments, process_payment_webhook};
use crate::inbound::http::users::{
    create_user, delete_user, list_users, read_users_me, update_user,
};
use crate::outbound::cache::RedisKeyValueCache;
use crate::outbound::persistence::{DbPool, PoolConfig};

/// SQL migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Register every API route under the configured prefix, plus the root
/// health endpoint.
pub fn configure_routes(config: &mut web::ServiceConfig, prefix: &str) {
    let api = web::scope(prefix)
        .service(issue_token)
        .service(read_users_me)
        .service(list_users)
        .service(create_user)
        .service(update_user)
        .service(delete_user)
        .service(get_user_accounts)
        .service(process_payment_webhook)
        .service(get_user_payments);
    config.service(api).service(health_check);
}

async fn run_migrations(database_url: &str) -> std::io::Result<()> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || -> Result<(), String> {
        use diesel::Connection;
        use diesel_migrations::MigrationHarness;

        let mut conn =
            diesel::PgConnection::establish(&url).map_err(|err| err.to_string())?;
        conn.run_pending_migrations(MIGRATIONS)
            .map(|_| ())
            .map_err(|err| err.to_string())
    })
    .await
    .map_err(|err| std::io::Error::other(err.to_string()))?
    .map_err(std::io::Error::other)
}

/// Build every collaborator from settings and serve until shutdown.
pub async fn run(settings: AppSettings) -> std::io::Result<()> {
    let database_url = settings.database_url().map_err(std::io::Error::other)?;
    let redis_url = settings.redis_url().map_err(std::io::Error::other)?;
    let service_config = ServiceConfig {
        token_secret: settings
            .secret_key()
            .map_err(std::io::Error::other)?
            .to_owned(),
        webhook_secret: settings
            .webhook_secret_key()
            .map_err(std::io::Error::other)?
            .to_owned(),
        token_ttl: settings.token_ttl(),
        cache_ttl: settings.cache_ttl(),
    };

    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(std::io::Error::other)?;
    run_migrations(database_url).await?;

    let cache = RedisKeyValueCache::connect(redis_url, 10)
        .await
        .map_err(std::io::Error::other)?;

    let state = web::Data::new(build_http_state(pool, cache, service_config));
    let prefix = settings.api_prefix().to_owned();
    let bind_addr = settings.bind_addr().to_owned();

    info!(bind_addr = %bind_addr, prefix = %prefix, "starting HTTP server");

    let server = HttpServer::new(move || {
        let prefix = prefix.clone();
        let app = App::new()
            .app_data(state.clone())
            .configure(|config| configure_routes(config, &prefix));

        #[cfg(debug_assertions)]
        let app = app.service(
            SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );

        app
    })
    .bind(bind_addr)?;

    server.run().await
}
