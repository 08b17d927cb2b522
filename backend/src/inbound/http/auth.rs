//! Bearer-token authentication: the login endpoint and request extractor.
//!
//! ```text
//! POST /api/v1/auth/token   username=ada@example.com&password=secret
//! Authorization: Bearer <token>
//! ```

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, post, web};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{DomainError, LoginCredentials, LoginValidationError, User};

use super::error::{ApiError, ApiResult};
use super::state::HttpState;

/// Stable message for every credential-validation failure on protected
/// routes, mirroring the non-distinction contract of the login flow.
const COULD_NOT_VALIDATE: &str = "Could not validate credentials";

/// Form body for `POST /api/v1/auth/token`.
///
/// `username` carries the email, matching the OAuth2 password-grant form
/// convention the original interface exposed.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenForm {
    /// Login email.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Response body for a successful token exchange.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Encoded bearer token.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

fn map_login_validation_error(err: LoginValidationError) -> ApiError {
    let error = match err {
        LoginValidationError::EmptyEmail => DomainError::invalid_request(
            "username must not be empty",
        )
        .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => DomainError::invalid_request(
            "password must not be empty",
        )
        .with_details(json!({ "field": "password", "code": "empty_password" })),
    };
    ApiError::from(error)
}

/// Exchange email/password credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    request_body(content = TokenForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Incorrect email or password", body = ApiError)
    ),
    tags = ["auth"],
    operation_id = "issueToken",
    security([])
)]
#[post("/auth/token")]
pub async fn issue_token(
    state: web::Data<HttpState>,
    form: web::Form<TokenForm>,
) -> ApiResult<web::Json<TokenResponse>> {
    let form = form.into_inner();
    let credentials = LoginCredentials::try_from_parts(&form.username, &form.password)
        .map_err(map_login_validation_error)?;

    let token = state.login.login(&credentials).await?;
    Ok(web::Json(TokenResponse {
        access_token: token.into(),
        token_type: "bearer".to_owned(),
    }))
}

/// The authenticated caller, extracted from the `Authorization` header.
///
/// Extraction validates the bearer token and loads the subject user; any
/// failure (missing header, bad signature, expiry, unknown subject) yields
/// the same 401 so callers cannot probe which step failed.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

fn bearer_token(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix("Bearer ")
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                ApiError::from(DomainError::internal("HTTP state not configured"))
            })?;

            let token = bearer_token(header.as_deref())
                .ok_or_else(|| ApiError::from(DomainError::unauthorized(COULD_NOT_VALIDATE)))?;

            let user_id = state
                .tokens
                .validate(token)
                .map_err(|_| ApiError::from(DomainError::unauthorized(COULD_NOT_VALIDATE)))?;

            let user = state.users_query.get_user(user_id).await?;
            let user = user
                .ok_or_else(|| ApiError::from(DomainError::unauthorized(COULD_NOT_VALIDATE)))?;

            Ok(Self(user))
        })
    }
}
