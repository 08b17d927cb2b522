//! Account service: lifecycle, cached listing, atomic balance adjustment.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use super::account::{Account, AccountId};
use super::cache::CacheService;
use super::cache_keys::{self, WriteOp};
use super::error::DomainError;
use super::ports::{AccountPersistenceError, AccountRepository, AccountsQuery, KeyValueCache};
use super::user::UserId;

pub(crate) fn map_account_persistence_error(error: AccountPersistenceError) -> DomainError {
    match error {
        AccountPersistenceError::Connection { message } => {
            DomainError::service_unavailable(message)
        }
        AccountPersistenceError::Query { message } => DomainError::internal(message),
        AccountPersistenceError::NotFound { .. } => DomainError::not_found("Account not found"),
        AccountPersistenceError::BalanceWouldGoNegative { .. } => {
            DomainError::invalid_request("Account balance cannot be negative")
        }
    }
}

/// Account service over the repository and cache.
#[derive(Clone)]
pub struct AccountService<A, C> {
    accounts: Arc<A>,
    cache: CacheService<C>,
}

impl<A, C> AccountService<A, C>
where
    A: AccountRepository,
    C: KeyValueCache,
{
    /// Create the service with its collaborators.
    pub fn new(accounts: Arc<A>, cache: CacheService<C>) -> Self {
        Self { accounts, cache }
    }

    /// Persist a zero-balance account for the user and invalidate the
    /// user's cached account list.
    pub async fn create_account(&self, user_id: UserId) -> Result<Account, DomainError> {
        let account = self
            .accounts
            .create(user_id)
            .await
            .map_err(map_account_persistence_error)?;

        info!(account_id = %account.id, user_id = %user_id, "account opened");
        self.cache.invalidate(WriteOp::AccountOpened { user_id }).await;
        Ok(account)
    }

    /// Fetch an account by identifier.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>, DomainError> {
        self.accounts
            .find_by_id(id)
            .await
            .map_err(map_account_persistence_error)
    }

    /// List a user's accounts through the TTL-bounded read cache.
    pub async fn get_accounts_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Account>, DomainError> {
        let key = cache_keys::user_accounts(user_id);
        if let Some(cached) = self.cache.get_json::<Vec<Account>>(&key).await {
            return Ok(cached);
        }

        let accounts = self
            .accounts
            .list_by_user(user_id)
            .await
            .map_err(map_account_persistence_error)?;

        self.cache.set_json(&key, &accounts).await;
        Ok(accounts)
    }

    /// Apply `delta` to the account balance.
    ///
    /// The check-then-write serialises inside the repository adapter (row
    /// lock), so concurrent adjustments to one account neither lose updates
    /// nor drive the balance negative. An adjustment whose result would be
    /// negative fails before anything is written.
    pub async fn adjust_balance(
        &self,
        id: AccountId,
        delta: Decimal,
    ) -> Result<Account, DomainError> {
        let account = self
            .accounts
            .adjust_balance(id, delta)
            .await
            .map_err(map_account_persistence_error)?;

        self.cache
            .invalidate(WriteOp::BalanceAdjusted {
                user_id: account.user_id,
                account_id: account.id,
            })
            .await;
        Ok(account)
    }
}

#[async_trait]
impl<A, C> AccountsQuery for AccountService<A, C>
where
    A: AccountRepository,
    C: KeyValueCache,
{
    async fn accounts_for_user(&self, user_id: UserId) -> Result<Vec<Account>, DomainError> {
        self.get_accounts_by_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockAccountRepository, MockKeyValueCache};
    use mockall::predicate::eq;
    use rstest::rstest;
    use std::time::Duration;

    fn account(balance: Decimal) -> Account {
        Account {
            id: AccountId::new(5),
            user_id: UserId::new(1),
            balance,
        }
    }

    fn make_service(
        accounts: MockAccountRepository,
        cache: MockKeyValueCache,
    ) -> AccountService<MockAccountRepository, MockKeyValueCache> {
        AccountService::new(
            Arc::new(accounts),
            CacheService::new(Arc::new(cache), Duration::from_secs(300)),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn listing_hits_cache_before_storage() {
        let cached = vec![account(Decimal::new(10_050, 2))];
        let serialized = serde_json::to_string(&cached).expect("serialises");
        let mut cache = MockKeyValueCache::new();
        cache
            .expect_get()
            .with(eq(cache_keys::user_accounts(UserId::new(1))))
            .return_once(move |_| Ok(Some(serialized)));
        // No repository expectations: storage must not be touched on a hit.
        let accounts = MockAccountRepository::new();

        let listed = make_service(accounts, cache)
            .get_accounts_by_user(UserId::new(1))
            .await
            .expect("listing succeeds");
        assert_eq!(listed, cached);
    }

    #[rstest]
    #[tokio::test]
    async fn listing_miss_populates_cache_from_storage() {
        let mut cache = MockKeyValueCache::new();
        cache.expect_get().return_once(|_| Ok(None));
        cache
            .expect_set()
            .withf(|key, value, _| {
                key.as_str() == "accounts:user:1" && value.contains("\"100.50\"")
            })
            .return_once(|_, _, _| Ok(()));
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_list_by_user()
            .with(eq(UserId::new(1)))
            .return_once(|_| Ok(vec![account(Decimal::new(10_050, 2))]));

        let listed = make_service(accounts, cache)
            .get_accounts_by_user(UserId::new(1))
            .await
            .expect("listing succeeds");
        assert_eq!(listed.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn negative_result_maps_to_invalid_request() {
        let mut accounts = MockAccountRepository::new();
        accounts.expect_adjust_balance().return_once(|id, _| {
            Err(AccountPersistenceError::BalanceWouldGoNegative { account_id: id })
        });

        let err = make_service(accounts, MockKeyValueCache::new())
            .adjust_balance(AccountId::new(5), Decimal::new(-1, 0))
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), "Account balance cannot be negative");
    }

    #[rstest]
    #[tokio::test]
    async fn successful_adjustment_invalidates_owner_cache() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_adjust_balance()
            .with(eq(AccountId::new(5)), eq(Decimal::new(10_050, 2)))
            .return_once(|_, delta| Ok(account(delta)));
        let mut cache = MockKeyValueCache::new();
        cache.expect_delete().times(2).returning(|_| Ok(()));

        let adjusted = make_service(accounts, cache)
            .adjust_balance(AccountId::new(5), Decimal::new(10_050, 2))
            .await
            .expect("adjustment succeeds");
        assert_eq!(adjusted.balance, Decimal::new(10_050, 2));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_account_maps_to_not_found() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_adjust_balance()
            .return_once(|id, _| Err(AccountPersistenceError::NotFound { account_id: id }));

        let err = make_service(accounts, MockKeyValueCache::new())
            .adjust_balance(AccountId::new(404), Decimal::ONE)
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn account_creation_invalidates_list_cache() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_create()
            .with(eq(UserId::new(1)))
            .return_once(|_| Ok(account(Decimal::ZERO)));
        let mut cache = MockKeyValueCache::new();
        cache
            .expect_delete()
            .with(eq(cache_keys::user_accounts(UserId::new(1))))
            .return_once(|_| Ok(()));

        let created = make_service(accounts, cache)
            .create_account(UserId::new(1))
            .await
            .expect("creation succeeds");
        assert_eq!(created.balance, Decimal::ZERO);
    }
}
