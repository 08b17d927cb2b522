//! Central table of cache keys and the invalidation rules for writes.
//!
//! Every cache key used anywhere in the services is built here, and every
//! write path names its [`WriteOp`] instead of deleting keys ad hoc. New
//! write paths therefore cannot forget an invalidation: adding a variant
//! forces the match below to say which keys go stale.

use super::account::AccountId;
use super::payment::PaymentId;
use super::ports::CacheKey;
use super::user::UserId;

/// Key for the serialised account list of one user.
pub fn user_accounts(user_id: UserId) -> CacheKey {
    CacheKey::from_trusted(format!("accounts:user:{user_id}"))
}

/// Key for one serialised payment.
pub fn payment(payment_id: PaymentId) -> CacheKey {
    CacheKey::from_trusted(format!("payment:{payment_id}"))
}

/// Key for the serialised payment list of one user.
pub fn user_payments(user_id: UserId) -> CacheKey {
    CacheKey::from_trusted(format!("payments:user:{user_id}"))
}

/// Key for one serialised account.
pub fn account(account_id: AccountId) -> CacheKey {
    CacheKey::from_trusted(format!("account:{account_id}"))
}

/// Write operations that can leave cache entries stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    /// A zero-balance account was opened for the user.
    AccountOpened {
        /// Owner of the new account.
        user_id: UserId,
    },
    /// An account balance changed.
    BalanceAdjusted {
        /// Owner of the adjusted account.
        user_id: UserId,
        /// The adjusted account.
        account_id: AccountId,
    },
    /// A payment row was recorded (and its account credited).
    PaymentRecorded {
        /// Credited user.
        user_id: UserId,
        /// Credited account.
        account_id: AccountId,
    },
    /// A user row was removed.
    UserDeleted {
        /// The removed user.
        user_id: UserId,
    },
}

/// The cache entries made stale by a write operation.
pub fn stale_keys(op: WriteOp) -> Vec<CacheKey> {
    match op {
        WriteOp::AccountOpened { user_id } => vec![user_accounts(user_id)],
        WriteOp::BalanceAdjusted {
            user_id,
            account_id,
        } => vec![user_accounts(user_id), account(account_id)],
        WriteOp::PaymentRecorded {
            user_id,
            account_id,
        } => vec![
            user_payments(user_id),
            user_accounts(user_id),
            account(account_id),
        ],
        WriteOp::UserDeleted { user_id } => {
            vec![user_accounts(user_id), user_payments(user_id)]
        }
    }
}
