//! Authentication service: credential checks, token issue, admin gate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::auth::{AccessToken, LoginCredentials};
use super::error::DomainError;
use super::ports::{LoginService, PasswordHasher, TokenCodec, UserRepository};
use super::user::{EmailAddress, User};
use super::user_service::map_user_persistence_error;

/// Gate for administrative endpoints.
///
/// # Examples
/// ```
/// use backend::domain::{require_admin, ErrorCode};
/// # use backend::domain::{EmailAddress, PasswordHash, User, UserId};
/// # let user = User {
/// #     id: UserId::new(1),
/// #     email: EmailAddress::new("ada@example.com").unwrap(),
/// #     full_name: "Ada".into(),
/// #     password_hash: PasswordHash::new("digest"),
/// #     is_admin: false,
/// # };
/// let err = require_admin(&user).unwrap_err();
/// assert_eq!(err.code(), ErrorCode::Forbidden);
/// ```
pub fn require_admin(user: &User) -> Result<(), DomainError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(DomainError::forbidden(
            "The user doesn't have enough privileges",
        ))
    }
}

/// Authentication service over the user repository, credential hasher, and
/// token codec.
#[derive(Clone)]
pub struct AuthService<U, H, T> {
    users: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    token_ttl: Duration,
}

impl<U, H, T> AuthService<U, H, T>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenCodec,
{
    /// Create the service with its collaborators and the configured token
    /// lifetime.
    pub fn new(users: Arc<U>, hasher: Arc<H>, tokens: Arc<T>, token_ttl: Duration) -> Self {
        Self {
            users,
            hasher,
            tokens,
            token_ttl,
        }
    }

    /// Check credentials against the stored digest.
    ///
    /// Returns `None` both when the email is unknown and when the password
    /// does not verify; callers cannot distinguish the two cases.
    pub async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<User>, DomainError> {
        let Ok(email) = EmailAddress::new(credentials.email()) else {
            warn!("authentication failed: email failed validation");
            return Ok(None);
        };

        let user = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_persistence_error)?;

        let Some(user) = user else {
            warn!(email = %email, "authentication failed: user not found");
            return Ok(None);
        };

        if !self
            .hasher
            .verify(credentials.password(), &user.password_hash)
        {
            warn!(email = %email, "authentication failed: invalid password");
            return Ok(None);
        }

        info!(email = %email, "user authenticated");
        Ok(Some(user))
    }
}

#[async_trait]
impl<U, H, T> LoginService for AuthService<U, H, T>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenCodec,
{
    async fn login(&self, credentials: &LoginCredentials) -> Result<AccessToken, DomainError> {
        let user = self
            .authenticate(credentials)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Incorrect email or password"))?;

        let token = self
            .tokens
            .issue(user.id, self.token_ttl)
            .map_err(|err| DomainError::internal(format!("token issue failed: {err}")))?;

        Ok(token)
    }
}
