//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::domain::{
    Account, AccountId, EmailAddress, PasswordHash, Payment, PaymentId, TransactionId, User,
    UserId, UserValidationError,
};

use super::schema::{accounts, payments, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub hashed_password: String,
    pub is_admin: bool,
}

impl UserRow {
    /// Convert into the domain aggregate, re-validating the stored email.
    pub(crate) fn into_domain(self) -> Result<User, UserValidationError> {
        Ok(User {
            id: UserId::new(self.id),
            email: EmailAddress::new(self.email)?,
            full_name: self.full_name,
            password_hash: PasswordHash::new(self.hashed_password),
            is_admin: self.is_admin,
        })
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
    pub hashed_password: &'a str,
    pub is_admin: bool,
}

/// Changeset struct for partial user updates.
///
/// `None` fields are skipped by Diesel, which realises the patch semantics
/// of the domain's `UserUpdate`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangeset<'a> {
    pub email: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub hashed_password: Option<&'a str>,
}

impl UserChangeset<'_> {
    pub(crate) fn is_empty(&self) -> bool {
        self.email.is_none() && self.full_name.is_none() && self.hashed_password.is_none()
    }
}

/// Row struct for reading from the accounts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccountRow {
    pub id: i32,
    pub user_id: i32,
    pub balance: Decimal,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: AccountId::new(row.id),
            user_id: UserId::new(row.user_id),
            balance: row.balance,
        }
    }
}

/// Insertable struct for opening new accounts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub(crate) struct NewAccountRow {
    pub user_id: i32,
    pub balance: Decimal,
}

/// Row struct for reading from the payments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub id: i32,
    pub transaction_id: String,
    pub user_id: i32,
    pub account_id: i32,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl PaymentRow {
    /// Convert into the domain aggregate, re-validating the stored
    /// transaction identifier.
    pub(crate) fn into_domain(
        self,
    ) -> Result<Payment, crate::domain::TransactionIdValidationError> {
        Ok(Payment {
            id: PaymentId::new(self.id),
            transaction_id: TransactionId::new(self.transaction_id)?,
            user_id: UserId::new(self.user_id),
            account_id: AccountId::new(self.account_id),
            amount: self.amount,
            created_at: self.created_at,
        })
    }
}

/// Insertable struct for recording payments.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub(crate) struct NewPaymentRow<'a> {
    pub transaction_id: &'a str,
    pub user_id: i32,
    pub account_id: i32,
    pub amount: Decimal,
}
