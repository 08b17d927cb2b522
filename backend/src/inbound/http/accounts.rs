//! Accounts API handlers.
//!
//! ```text
//! GET /api/v1/accounts/me
//! ```

use actix_web::{get, web};

use super::auth::AuthenticatedUser;
use super::error::{ApiError, ApiResult};
use super::schemas::AccountResponse;
use super::state::HttpState;

/// List the accounts of the authenticated caller.
#[utoipa::path(
    get,
    path = "/api/v1/accounts/me",
    responses(
        (status = 200, description = "Accounts of the current user", body = [AccountResponse]),
        (status = 401, description = "Unauthorised", body = ApiError)
    ),
    tags = ["accounts"],
    operation_id = "getUserAccounts"
)]
#[get("/accounts/me")]
pub async fn get_user_accounts(
    user: AuthenticatedUser,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<AccountResponse>>> {
    let accounts = state.accounts.accounts_for_user(user.0.id).await?;
    Ok(web::Json(accounts.into_iter().map(Into::into).collect()))
}
