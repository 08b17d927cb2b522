//! Account data model.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Stable account identifier assigned by the database sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i32);

impl AccountId {
    /// Wrap a database-assigned identifier.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Access the raw integer identifier.
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monetary account owned by exactly one user.
///
/// ## Invariants
/// - `balance` is never negative; the persistence adapter rejects any
///   adjustment that would violate this before writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Database-assigned identifier.
    pub id: AccountId,
    /// Owning user.
    pub user_id: UserId,
    /// Current balance as a fixed-point decimal.
    pub balance: Decimal,
}

impl Account {
    /// Whether crediting `delta` would keep the balance non-negative.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{Account, AccountId, UserId};
    /// use rust_decimal::Decimal;
    ///
    /// let account = Account {
    ///     id: AccountId::new(1),
    ///     user_id: UserId::new(1),
    ///     balance: Decimal::new(1000, 2),
    /// };
    /// assert!(account.can_apply(Decimal::new(-1000, 2)));
    /// assert!(!account.can_apply(Decimal::new(-1001, 2)));
    /// ```
    pub fn can_apply(&self, delta: Decimal) -> bool {
        self.balance + delta >= Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn account(balance: Decimal) -> Account {
        Account {
            id: AccountId::new(7),
            user_id: UserId::new(3),
            balance,
        }
    }

    #[rstest]
    #[case(Decimal::new(10_050, 2), Decimal::new(-10_050, 2), true)]
    #[case(Decimal::new(10_050, 2), Decimal::new(-10_051, 2), false)]
    #[case(Decimal::ZERO, Decimal::ZERO, true)]
    #[case(Decimal::ZERO, Decimal::new(-1, 2), false)]
    fn can_apply_matches_non_negativity(
        #[case] balance: Decimal,
        #[case] delta: Decimal,
        #[case] expected: bool,
    ) {
        assert_eq!(account(balance).can_apply(delta), expected);
    }
}
