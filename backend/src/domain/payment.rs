//! Payment data model and webhook payload.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountId;
use super::user::UserId;

/// Validation errors returned by [`TransactionId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionIdValidationError {
    /// Identifier was blank once trimmed.
    Empty,
    /// Identifier carried surrounding whitespace.
    ContainsWhitespace,
}

impl fmt::Display for TransactionIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "transaction id must not be empty"),
            Self::ContainsWhitespace => {
                write!(f, "transaction id must not contain surrounding whitespace")
            }
        }
    }
}

impl std::error::Error for TransactionIdValidationError {}

/// Processor-assigned transaction identifier; the idempotency key for
/// webhook deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

impl TransactionId {
    /// Validate and construct a [`TransactionId`].
    pub fn new(value: impl Into<String>) -> Result<Self, TransactionIdValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(TransactionIdValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(TransactionIdValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Borrow the underlying identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TransactionId> for String {
    fn from(value: TransactionId) -> Self {
        value.0
    }
}

impl TryFrom<String> for TransactionId {
    type Error = TransactionIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Stable payment identifier assigned by the database sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(i32);

impl PaymentId {
    /// Wrap a database-assigned identifier.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Access the raw integer identifier.
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable record of one processed webhook event.
///
/// Created exactly once per distinct transaction identifier; never updated
/// or deleted by the services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Database-assigned identifier.
    pub id: PaymentId,
    /// Processor transaction identifier (globally unique).
    pub transaction_id: TransactionId,
    /// User credited by the payment.
    pub user_id: UserId,
    /// Account credited by the payment; its owner matches `user_id` at
    /// creation time.
    pub account_id: AccountId,
    /// Signed fixed-point amount.
    pub amount: Decimal,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fields required to record a payment; id and timestamp are assigned by
/// storage.
#[derive(Debug, Clone)]
pub struct NewPayment {
    /// Processor transaction identifier.
    pub transaction_id: TransactionId,
    /// User credited by the payment.
    pub user_id: UserId,
    /// Resolved account to credit.
    pub account_id: AccountId,
    /// Signed fixed-point amount.
    pub amount: Decimal,
}

/// Inbound webhook payload, exactly as delivered by the payment processor.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookPayload {
    /// Idempotency key for the delivery.
    pub transaction_id: TransactionId,
    /// Claimed user to credit.
    pub user_id: UserId,
    /// Claimed account to credit; not trusted until ownership is checked.
    pub account_id: AccountId,
    /// Signed fixed-point amount.
    pub amount: Decimal,
    /// Hex-encoded SHA-256 over the canonical field concatenation plus the
    /// shared secret.
    pub signature: String,
}
