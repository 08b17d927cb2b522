//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports describe how the domain expects to interact with its
//! collaborators (database, cache, token codec, credential hasher). Driving
//! ports are the use-case traits the HTTP adapter calls into. Each driven
//! port exposes strongly typed errors so adapters map their failures into
//! predictable variants instead of returning `anyhow::Result`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use super::account::{Account, AccountId};
use super::auth::{AccessToken, LoginCredentials};
use super::error::DomainError;
use super::payment::{NewPayment, Payment, PaymentId, TransactionId, WebhookPayload};
use super::user::{
    EmailAddress, NewUser, PasswordHash, User, UserId, UserPatch, UserUpdate, UserWithAccounts,
};

/// Cache key used to store and retrieve serialised read models.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Construct a cache key after validating that it is non-empty and
    /// trimmed.
    pub fn new(value: impl Into<String>) -> Result<Self, CacheKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(CacheKeyValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(CacheKeyValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Construct a key from input the crate itself formats.
    ///
    /// Callers must pass a non-blank, trimmed string; the builders in
    /// `cache_keys` format ids into fixed templates and therefore satisfy
    /// this by construction.
    pub(crate) fn from_trusted(raw: String) -> Self {
        debug_assert!(!raw.trim().is_empty() && raw.trim() == raw);
        Self(raw)
    }

    /// Borrow the underlying key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validation errors returned when constructing [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheKeyValidationError {
    /// Key is empty after trimming whitespace.
    #[error("cache key must not be empty")]
    Empty,
    /// Key contains leading or trailing whitespace.
    #[error("cache key must not contain surrounding whitespace")]
    ContainsWhitespace,
}

/// Persistence errors raised by [`UserRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserPersistenceError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },
    /// The unique email constraint rejected an insert or update.
    #[error("email {email} is already registered")]
    DuplicateEmail { email: String },
}

impl UserPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Helper for unique-email violations.
    pub fn duplicate_email(email: impl Into<String>) -> Self {
        Self::DuplicateEmail {
            email: email.into(),
        }
    }
}

/// Persistence errors raised by [`AccountRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountPersistenceError {
    /// Repository connection could not be established.
    #[error("account repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("account repository query failed: {message}")]
    Query { message: String },
    /// The targeted account does not exist.
    #[error("account {account_id} not found")]
    NotFound { account_id: AccountId },
    /// Applying the delta would drive the balance below zero; nothing was
    /// written.
    #[error("adjustment would drive account {account_id} balance below zero")]
    BalanceWouldGoNegative { account_id: AccountId },
}

impl AccountPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence errors raised by [`PaymentRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentPersistenceError {
    /// Repository connection could not be established.
    #[error("payment repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("payment repository query failed: {message}")]
    Query { message: String },
    /// The unique transaction-id constraint rejected the insert; the
    /// delivery was already processed (possibly by a concurrent request).
    #[error("transaction {transaction_id} already recorded")]
    DuplicateTransaction { transaction_id: String },
    /// The account to credit vanished between resolution and recording.
    #[error("account {account_id} missing while recording payment")]
    AccountMissing { account_id: AccountId },
    /// Crediting the amount would drive the balance below zero; the whole
    /// transaction rolled back.
    #[error("crediting account {account_id} would drive its balance below zero")]
    BalanceWouldGoNegative { account_id: AccountId },
}

impl PaymentPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Helper for unique-constraint violations on the transaction id.
    pub fn duplicate_transaction(transaction_id: impl Into<String>) -> Self {
        Self::DuplicateTransaction {
            transaction_id: transaction_id.into(),
        }
    }
}

/// Errors surfaced by the caching adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Cache backend is unavailable or timing out.
    #[error("cache backend failure: {message}")]
    Backend { message: String },
    /// Serialisation or deserialisation of cached content failed.
    #[error("cache serialisation failed: {message}")]
    Serialization { message: String },
}

impl CacheError {
    /// Helper for backend-level failures.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Helper for serialisation problems.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the token codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature mismatch, malformed structure, or expired token.
    #[error("token is invalid or expired")]
    Invalid,
    /// Token decoded but carries no usable subject claim.
    #[error("token carries no subject")]
    MissingSubject,
    /// Token could not be encoded.
    #[error("token issuing failed: {message}")]
    Issue { message: String },
}

impl TokenError {
    /// Helper for encoding failures.
    pub fn issue(message: impl Into<String>) -> Self {
        Self::Issue {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the credential hasher when producing digests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("password hashing failed: {message}")]
pub struct PasswordHashError {
    /// Adapter-provided failure description.
    pub message: String,
}

impl PasswordHashError {
    /// Wrap an adapter failure message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Persistence port for user aggregates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; the unique email constraint maps to
    /// [`UserPersistenceError::DuplicateEmail`].
    async fn create(&self, user: NewUser) -> Result<User, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by unique email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// List every user with their accounts eagerly loaded.
    async fn list_with_accounts(&self) -> Result<Vec<UserWithAccounts>, UserPersistenceError>;

    /// Apply a partial update; `None` when the id does not exist.
    async fn update(
        &self,
        id: UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Delete a user; `true` when a row was removed. Owned accounts and
    /// payments cascade at the schema level.
    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError>;
}

/// Persistence port for account aggregates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persist a zero-balance account for the user.
    async fn create(&self, user_id: UserId) -> Result<Account, AccountPersistenceError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: AccountId)
    -> Result<Option<Account>, AccountPersistenceError>;

    /// List the accounts owned by a user.
    async fn list_by_user(&self, user_id: UserId)
    -> Result<Vec<Account>, AccountPersistenceError>;

    /// Atomically apply `delta` to the balance.
    ///
    /// The read-check-write must serialise per account (row lock or
    /// equivalent) so concurrent adjustments neither lose updates nor
    /// transiently violate the non-negativity invariant.
    async fn adjust_balance(
        &self,
        id: AccountId,
        delta: Decimal,
    ) -> Result<Account, AccountPersistenceError>;
}

/// Persistence port for payment records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Fetch a payment by identifier.
    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, PaymentPersistenceError>;

    /// Fetch a payment by its processor transaction identifier.
    async fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Payment>, PaymentPersistenceError>;

    /// List the payments credited to a user.
    async fn list_by_user(&self, user_id: UserId)
    -> Result<Vec<Payment>, PaymentPersistenceError>;

    /// Record a payment and credit its account in one atomic unit.
    ///
    /// Either both the payment row and the balance change commit, or
    /// neither does. A concurrent duplicate insert fails with
    /// [`PaymentPersistenceError::DuplicateTransaction`] via the storage
    /// unique constraint, never by double-crediting.
    async fn record(&self, payment: NewPayment) -> Result<Payment, PaymentPersistenceError>;
}

/// Cache port with TTL semantics over serialised string values.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Read a cached value for the given key.
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    /// Store a value under the key, expiring after `ttl`.
    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Drop the value stored under the key, if any.
    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError>;
}

/// One-way credential hashing port.
///
/// Hashing is CPU-bound, so the port is synchronous; callers needing to keep
/// an executor responsive can wrap calls in a blocking task.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted digest of the plaintext.
    fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHashError>;

    /// Check the plaintext against a stored digest. A malformed digest
    /// yields `false`, never an error.
    fn verify(&self, plaintext: &str, digest: &PasswordHash) -> bool;
}

/// Bearer token encode/decode port.
#[cfg_attr(test, mockall::automock)]
pub trait TokenCodec: Send + Sync {
    /// Encode a token carrying the subject and an absolute expiry `ttl`
    /// from now (UTC wall clock).
    fn issue(&self, subject: UserId, ttl: Duration) -> Result<AccessToken, TokenError>;

    /// Decode and verify a token, returning its subject.
    fn validate(&self, token: &str) -> Result<UserId, TokenError>;
}

/// Driving port: authenticate credentials and issue a bearer token.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Exchange credentials for a token, or `Unauthorized` when the email is
    /// unknown or the password does not verify (indistinguishable cases).
    async fn login(&self, credentials: &LoginCredentials) -> Result<AccessToken, DomainError>;
}

/// Driving port: user read models.
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Fetch a user by identifier.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, DomainError>;

    /// Fetch a user by unique email.
    async fn get_user_by_email(&self, email: &EmailAddress)
    -> Result<Option<User>, DomainError>;

    /// List every user with accounts eagerly loaded (admin listing).
    async fn list_users(&self) -> Result<Vec<UserWithAccounts>, DomainError>;
}

/// Registration payload consumed by [`UsersCommand::create_user`].
#[derive(Debug, Clone)]
pub struct RegisterUser {
    /// Unique login email.
    pub email: EmailAddress,
    /// Display name.
    pub full_name: String,
    /// Plaintext password; hashed by the user service before persistence.
    pub password: String,
}

/// Driving port: user mutations.
#[async_trait]
pub trait UsersCommand: Send + Sync {
    /// Register a user, hashing the password before persistence.
    async fn create_user(&self, request: RegisterUser) -> Result<User, DomainError>;

    /// Apply a partial update; `None` when the id does not exist.
    async fn update_user(&self, id: UserId, patch: UserPatch)
    -> Result<Option<User>, DomainError>;

    /// Delete a user; `true` when a row was removed.
    async fn delete_user(&self, id: UserId) -> Result<bool, DomainError>;
}

/// Driving port: account read models.
#[async_trait]
pub trait AccountsQuery: Send + Sync {
    /// List the accounts owned by a user (read-through cached).
    async fn accounts_for_user(&self, user_id: UserId) -> Result<Vec<Account>, DomainError>;
}

/// Driving port: the payment webhook pipeline.
#[async_trait]
pub trait PaymentWebhook: Send + Sync {
    /// Run the full ingestion pipeline for one delivery.
    async fn process_payment(&self, payload: WebhookPayload) -> Result<Payment, DomainError>;
}

/// Driving port: payment read models.
#[async_trait]
pub trait PaymentsQuery: Send + Sync {
    /// List the payments credited to a user.
    async fn payments_for_user(&self, user_id: UserId) -> Result<Vec<Payment>, DomainError>;
}
