//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! The unique index on `users.email` enforces registration uniqueness; this
//! adapter maps its violation to the port's `DuplicateEmail` variant so the
//! service can answer with a conflict instead of a bare storage failure.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{
    EmailAddress, NewUser, User, UserId, UserUpdate, UserWithAccounts,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AccountRow, NewUserRow, UserChangeset, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{accounts, users};

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_user_pool_error(error: PoolError) -> UserPersistenceError {
    map_pool_error(error, UserPersistenceError::connection)
}

fn map_user_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_diesel_error(
        error,
        |m| UserPersistenceError::query(m),
        |m| UserPersistenceError::connection(m),
    )
}

fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    row.into_domain()
        .map_err(|err| UserPersistenceError::query(format!("corrupted user row: {err}")))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserPersistenceError> {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        let mut conn = self.pool.get().await.map_err(map_user_pool_error)?;

        let new_row = NewUserRow {
            email: user.email.as_str(),
            full_name: user.full_name.as_str(),
            hashed_password: user.password_hash.as_str(),
            is_admin: user.is_admin,
        };

        let row: UserRow = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    UserPersistenceError::duplicate_email(user.email.as_str())
                }
                other => map_user_diesel_error(other),
            })?;

        row_to_user(row)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_user_pool_error)?;

        let row: Option<UserRow> = users::table
            .find(id.as_i32())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_user_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_user_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_user_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn list_with_accounts(&self) -> Result<Vec<UserWithAccounts>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_user_pool_error)?;

        let user_rows: Vec<UserRow> = users::table
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_user_diesel_error)?;

        let account_rows: Vec<AccountRow> = accounts::table
            .order(accounts::id.asc())
            .select(AccountRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_user_diesel_error)?;

        let mut accounts_by_user: HashMap<i32, Vec<AccountRow>> = HashMap::new();
        for row in account_rows {
            accounts_by_user.entry(row.user_id).or_default().push(row);
        }

        user_rows
            .into_iter()
            .map(|row| {
                let owned = accounts_by_user.remove(&row.id).unwrap_or_default();
                Ok(UserWithAccounts {
                    user: row_to_user(row)?,
                    accounts: owned.into_iter().map(Into::into).collect(),
                })
            })
            .collect()
    }

    async fn update(
        &self,
        id: UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, UserPersistenceError> {
        let changeset = UserChangeset {
            email: update.email.as_ref().map(EmailAddress::as_str),
            full_name: update.full_name.as_deref(),
            hashed_password: update.password_hash.as_ref().map(|hash| hash.as_str()),
        };

        // An all-None changeset is not a valid UPDATE statement; the patch
        // degenerates to a fetch, matching the port's partial-update
        // contract.
        if changeset.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut conn = self.pool.get().await.map_err(map_user_pool_error)?;

        let row: Option<UserRow> = diesel::update(users::table.find(id.as_i32()))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| match (&update.email, err) {
                // An email change can trip the same unique index as an
                // insert.
                (
                    Some(email),
                    diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        _,
                    ),
                ) => UserPersistenceError::duplicate_email(email.as_str()),
                (_, other) => map_user_diesel_error(other),
            })?;

        row.map(row_to_user).transpose()
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_user_pool_error)?;

        let deleted = diesel::delete(users::table.find(id.as_i32()))
            .execute(&mut conn)
            .await
            .map_err(map_user_diesel_error)?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let mapped = map_user_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(mapped, UserPersistenceError::Connection { .. }));
    }

    #[rstest]
    fn generic_diesel_error_maps_to_query_error() {
        let mapped = map_user_diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(mapped, UserPersistenceError::Query { .. }));
    }
}
