//! PostgreSQL-backed `PaymentRepository` implementation using Diesel ORM.
//!
//! `record` carries both of the system's serialisation points in a single
//! transaction: the payment insert races against the unique index on
//! `payments.transaction_id` (a concurrent duplicate fails atomically, and
//! the rollback discards the credit), and the balance credit runs against a
//! row locked with `SELECT ... FOR UPDATE`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use rust_decimal::Decimal;

use crate::domain::ports::{PaymentPersistenceError, PaymentRepository};
use crate::domain::{NewPayment, Payment, PaymentId, TransactionId, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AccountRow, NewPaymentRow, PaymentRow};
use super::pool::{DbPool, PoolError};
use super::schema::{accounts, payments};

/// Diesel-backed implementation of the `PaymentRepository` port.
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_payment_pool_error(error: PoolError) -> PaymentPersistenceError {
    map_pool_error(error, PaymentPersistenceError::connection)
}

fn map_payment_diesel_error(error: diesel::result::Error) -> PaymentPersistenceError {
    map_diesel_error(
        error,
        |m| PaymentPersistenceError::query(m),
        |m| PaymentPersistenceError::connection(m),
    )
}

fn row_to_payment(row: PaymentRow) -> Result<Payment, PaymentPersistenceError> {
    row.into_domain()
        .map_err(|err| PaymentPersistenceError::query(format!("corrupted payment row: {err}")))
}

/// Transaction-local outcome for the atomic record-and-credit operation.
enum RecordTxError {
    AccountMissing,
    Negative,
    Duplicate,
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for RecordTxError {
    fn from(error: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        // The only unique index touched inside the transaction is the one
        // on transaction_id, so a unique violation is always a duplicate
        // delivery.
        match error {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => Self::Duplicate,
            other => Self::Diesel(other),
        }
    }
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn find_by_id(
        &self,
        id: PaymentId,
    ) -> Result<Option<Payment>, PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_payment_pool_error)?;

        let row: Option<PaymentRow> = payments::table
            .find(id.as_i32())
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_payment_diesel_error)?;

        row.map(row_to_payment).transpose()
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Payment>, PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_payment_pool_error)?;

        let row: Option<PaymentRow> = payments::table
            .filter(payments::transaction_id.eq(transaction_id.as_str()))
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_payment_diesel_error)?;

        row.map(row_to_payment).transpose()
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Payment>, PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_payment_pool_error)?;

        let rows: Vec<PaymentRow> = payments::table
            .filter(payments::user_id.eq(user_id.as_i32()))
            .order(payments::id.asc())
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_payment_diesel_error)?;

        rows.into_iter().map(row_to_payment).collect()
    }

    async fn record(&self, payment: NewPayment) -> Result<Payment, PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_payment_pool_error)?;

        let account_id = payment.account_id;
        let transaction_id = payment.transaction_id.clone();

        let result = conn
            .transaction::<PaymentRow, RecordTxError, _>(|conn| {
                async move {
                    let account: Option<AccountRow> = accounts::table
                        .find(payment.account_id.as_i32())
                        .select(AccountRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;

                    let account = account.ok_or(RecordTxError::AccountMissing)?;
                    let new_balance = account.balance + payment.amount;
                    if new_balance < Decimal::ZERO {
                        return Err(RecordTxError::Negative);
                    }

                    let new_row = NewPaymentRow {
                        transaction_id: payment.transaction_id.as_str(),
                        user_id: payment.user_id.as_i32(),
                        account_id: payment.account_id.as_i32(),
                        amount: payment.amount,
                    };
                    let row: PaymentRow = diesel::insert_into(payments::table)
                        .values(&new_row)
                        .returning(PaymentRow::as_returning())
                        .get_result(conn)
                        .await?;

                    diesel::update(accounts::table.find(payment.account_id.as_i32()))
                        .set(accounts::balance.eq(new_balance))
                        .execute(conn)
                        .await?;

                    Ok(row)
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok(row) => row_to_payment(row),
            Err(RecordTxError::AccountMissing) => {
                Err(PaymentPersistenceError::AccountMissing { account_id })
            }
            Err(RecordTxError::Negative) => {
                Err(PaymentPersistenceError::BalanceWouldGoNegative { account_id })
            }
            Err(RecordTxError::Duplicate) => Err(
                PaymentPersistenceError::duplicate_transaction(transaction_id.as_str()),
            ),
            Err(RecordTxError::Diesel(err)) => Err(map_payment_diesel_error(err)),
        }
    }
}
