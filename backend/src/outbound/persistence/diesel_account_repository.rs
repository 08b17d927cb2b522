//! PostgreSQL-backed `AccountRepository` implementation using Diesel ORM.
//!
//! `adjust_balance` is one of the two serialisation points the system's
//! correctness rests on: the row is locked with `SELECT ... FOR UPDATE`
//! inside a transaction, the non-negativity check runs against the locked
//! balance, and the write either commits with the check satisfied or the
//! whole transaction rolls back.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use rust_decimal::Decimal;

use crate::domain::ports::{AccountPersistenceError, AccountRepository};
use crate::domain::{Account, AccountId, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AccountRow, NewAccountRow};
use super::pool::{DbPool, PoolError};
use super::schema::accounts;

/// Diesel-backed implementation of the `AccountRepository` port.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_account_pool_error(error: PoolError) -> AccountPersistenceError {
    map_pool_error(error, AccountPersistenceError::connection)
}

fn map_account_diesel_error(error: diesel::result::Error) -> AccountPersistenceError {
    map_diesel_error(
        error,
        |m| AccountPersistenceError::query(m),
        |m| AccountPersistenceError::connection(m),
    )
}

/// Transaction-local outcome for the locked adjust operation.
enum AdjustTxError {
    NotFound,
    Negative,
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for AdjustTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn create(&self, user_id: UserId) -> Result<Account, AccountPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_account_pool_error)?;

        let new_row = NewAccountRow {
            user_id: user_id.as_i32(),
            balance: Decimal::ZERO,
        };

        let row: AccountRow = diesel::insert_into(accounts::table)
            .values(&new_row)
            .returning(AccountRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_account_diesel_error)?;

        Ok(row.into())
    }

    async fn find_by_id(
        &self,
        id: AccountId,
    ) -> Result<Option<Account>, AccountPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_account_pool_error)?;

        let row: Option<AccountRow> = accounts::table
            .find(id.as_i32())
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_account_diesel_error)?;

        Ok(row.map(Into::into))
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Account>, AccountPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_account_pool_error)?;

        let rows: Vec<AccountRow> = accounts::table
            .filter(accounts::user_id.eq(user_id.as_i32()))
            .order(accounts::id.asc())
            .select(AccountRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_account_diesel_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn adjust_balance(
        &self,
        id: AccountId,
        delta: Decimal,
    ) -> Result<Account, AccountPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_account_pool_error)?;

        let result = conn
            .transaction::<AccountRow, AdjustTxError, _>(|conn| {
                async move {
                    let row: Option<AccountRow> = accounts::table
                        .find(id.as_i32())
                        .select(AccountRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;

                    let row = row.ok_or(AdjustTxError::NotFound)?;
                    let new_balance = row.balance + delta;
                    if new_balance < Decimal::ZERO {
                        return Err(AdjustTxError::Negative);
                    }

                    let updated: AccountRow = diesel::update(accounts::table.find(id.as_i32()))
                        .set(accounts::balance.eq(new_balance))
                        .returning(AccountRow::as_returning())
                        .get_result(conn)
                        .await?;

                    Ok(updated)
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(AdjustTxError::NotFound) => {
                Err(AccountPersistenceError::NotFound { account_id: id })
            }
            Err(AdjustTxError::Negative) => {
                Err(AccountPersistenceError::BalanceWouldGoNegative { account_id: id })
            }
            Err(AdjustTxError::Diesel(err)) => Err(map_account_diesel_error(err)),
        }
    }
}
