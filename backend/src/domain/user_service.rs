//! User service: registration, typed partial updates, deletion, lookups.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::cache::CacheService;
use super::cache_keys::WriteOp;
use super::error::DomainError;
use super::ports::{
    KeyValueCache, PasswordHasher, RegisterUser, UserPersistenceError, UserRepository,
    UsersCommand, UsersQuery,
};
use super::user::{EmailAddress, NewUser, User, UserId, UserPatch, UserUpdate, UserWithAccounts};

pub(crate) fn map_user_persistence_error(error: UserPersistenceError) -> DomainError {
    match error {
        UserPersistenceError::Connection { message } => DomainError::service_unavailable(message),
        UserPersistenceError::Query { message } => DomainError::internal(message),
        UserPersistenceError::DuplicateEmail { .. } => {
            DomainError::conflict("Email already registered")
        }
    }
}

/// User service over the repository, credential hasher, and cache.
#[derive(Clone)]
pub struct UserService<U, H, C> {
    users: Arc<U>,
    hasher: Arc<H>,
    cache: CacheService<C>,
}

impl<U, H, C> UserService<U, H, C>
where
    U: UserRepository,
    H: PasswordHasher,
    C: KeyValueCache,
{
    /// Create the service with its collaborators.
    pub fn new(users: Arc<U>, hasher: Arc<H>, cache: CacheService<C>) -> Self {
        Self {
            users,
            hasher,
            cache,
        }
    }

    fn hash_password(&self, plaintext: &str) -> Result<super::user::PasswordHash, DomainError> {
        self.hasher
            .hash(plaintext)
            .map_err(|err| DomainError::internal(format!("password hashing failed: {err}")))
    }
}

#[async_trait]
impl<U, H, C> UsersCommand for UserService<U, H, C>
where
    U: UserRepository,
    H: PasswordHasher,
    C: KeyValueCache,
{
    async fn create_user(&self, request: RegisterUser) -> Result<User, DomainError> {
        let password_hash = self.hash_password(&request.password)?;
        let user = self
            .users
            .create(NewUser {
                email: request.email,
                full_name: request.full_name,
                password_hash,
                is_admin: false,
            })
            .await
            .map_err(map_user_persistence_error)?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    async fn update_user(
        &self,
        id: UserId,
        patch: UserPatch,
    ) -> Result<Option<User>, DomainError> {
        // Re-hash when the patch carries a password; other fields pass
        // through unchanged. An empty patch degenerates to a fetch.
        let password_hash = match patch.password.as_deref() {
            Some(plaintext) => Some(self.hash_password(plaintext)?),
            None => None,
        };

        let update = UserUpdate {
            email: patch.email,
            full_name: patch.full_name,
            password_hash,
        };

        self.users
            .update(id, update)
            .await
            .map_err(map_user_persistence_error)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, DomainError> {
        let removed = self
            .users
            .delete(id)
            .await
            .map_err(map_user_persistence_error)?;

        if removed {
            info!(user_id = %id, "user deleted");
            self.cache.invalidate(WriteOp::UserDeleted { user_id: id }).await;
        }
        Ok(removed)
    }
}

#[async_trait]
impl<U, H, C> UsersQuery for UserService<U, H, C>
where
    U: UserRepository,
    H: PasswordHasher,
    C: KeyValueCache,
{
    async fn get_user(&self, id: UserId) -> Result<Option<User>, DomainError> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_persistence_error)
    }

    async fn get_user_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, DomainError> {
        self.users
            .find_by_email(email)
            .await
            .map_err(map_user_persistence_error)
    }

    async fn list_users(&self) -> Result<Vec<UserWithAccounts>, DomainError> {
        self.users
            .list_with_accounts()
            .await
            .map_err(map_user_persistence_error)
    }
}
