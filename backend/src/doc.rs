//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct that generates the OpenAPI specification
//! for the REST API: every HTTP endpoint from the inbound layer, the DTO
//! schemas, and the bearer-token security scheme. Swagger UI serves the
//! document in debug builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Token issued by POST /api/v1/auth/token."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Payment System API",
        description = "Payment-account service: bearer authentication, per-user \
                       accounts, and idempotent webhook ingestion."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::auth::issue_token,
        crate::inbound::http::users::read_users_me,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::accounts::get_user_accounts,
        crate::inbound::http::payments::process_payment_webhook,
        crate::inbound::http::payments::get_user_payments,
        crate::inbound::http::health::health_check,
    ),
    components(schemas(
        crate::inbound::http::auth::TokenForm,
        crate::inbound::http::auth::TokenResponse,
        crate::inbound::http::error::ApiError,
        crate::inbound::http::schemas::AccountResponse,
        crate::inbound::http::schemas::CreateUserRequest,
        crate::inbound::http::schemas::HealthResponse,
        crate::inbound::http::schemas::MessageResponse,
        crate::inbound::http::schemas::PaymentResponse,
        crate::inbound::http::schemas::UpdateUserRequest,
        crate::inbound::http::schemas::UserResponse,
        crate::inbound::http::schemas::UserWithAccountsResponse,
        crate::inbound::http::schemas::WebhookRequest,
    ))
)]
pub struct ApiDoc;
