//! Users API handlers.
//!
//! ```text
//! GET    /api/v1/users/me
//! GET    /api/v1/users          (admin)
//! POST   /api/v1/users          (admin)
//! PUT    /api/v1/users/{id}     (admin)
//! DELETE /api/v1/users/{id}     (admin)
//! ```

use actix_web::{delete, get, post, put, web};

use crate::domain::ports::RegisterUser;
use crate::domain::{DomainError, UserId, UserPatch, require_admin};

use super::auth::AuthenticatedUser;
use super::error::{ApiError, ApiResult};
use super::schemas::{
    CreateUserRequest, MessageResponse, UpdateUserRequest, UserResponse,
    UserWithAccountsResponse,
};
use super::state::HttpState;

/// Return the authenticated caller.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ApiError)
    ),
    tags = ["users"],
    operation_id = "readUsersMe"
)]
#[get("/users/me")]
pub async fn read_users_me(user: AuthenticatedUser) -> ApiResult<web::Json<UserResponse>> {
    Ok(web::Json(user.0.into()))
}

/// List every user with their accounts. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users with accounts", body = [UserWithAccountsResponse]),
        (status = 401, description = "Unauthorised", body = ApiError),
        (status = 403, description = "Forbidden", body = ApiError)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    user: AuthenticatedUser,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<UserWithAccountsResponse>>> {
    require_admin(&user.0)?;

    let users = state.users_query.list_users().await?;
    Ok(web::Json(users.into_iter().map(Into::into).collect()))
}

/// Register a user. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Created user", body = UserResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorised", body = ApiError),
        (status = 403, description = "Forbidden", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    user: AuthenticatedUser,
    state: web::Data<HttpState>,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    require_admin(&user.0)?;

    let payload = payload.into_inner();
    let email = payload.validated_email()?;
    let created = state
        .users_command
        .create_user(RegisterUser {
            email,
            full_name: payload.full_name,
            password: payload.password,
        })
        .await?;

    Ok(web::Json(created.into()))
}

/// Partially update a user. Admin only.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    request_body = UpdateUserRequest,
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorised", body = ApiError),
        (status = 403, description = "Forbidden", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    user: AuthenticatedUser,
    state: web::Data<HttpState>,
    path: web::Path<i32>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    require_admin(&user.0)?;

    let patch = UserPatch::try_from(payload.into_inner())?;
    let updated = state
        .users_command
        .update_user(UserId::new(path.into_inner()), patch)
        .await?
        .ok_or_else(|| ApiError::from(DomainError::not_found("User not found")))?;

    Ok(web::Json(updated.into()))
}

/// Delete a user. Admin only.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = ApiError),
        (status = 403, description = "Forbidden", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    user: AuthenticatedUser,
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<web::Json<MessageResponse>> {
    require_admin(&user.0)?;

    let removed = state
        .users_command
        .delete_user(UserId::new(path.into_inner()))
        .await?;
    if !removed {
        return Err(ApiError::from(DomainError::not_found("User not found")));
    }

    Ok(web::Json(MessageResponse {
        message: "User deleted successfully".to_owned(),
    }))
}
