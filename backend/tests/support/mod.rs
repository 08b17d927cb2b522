//! Shared in-memory adapters and fixtures for the integration suites.
//!
//! The adapters implement the domain ports with the same observable
//! semantics as the Diesel/Redis implementations: unique constraints on
//! emails and transaction ids, serialised balance adjustment, atomic
//! record-plus-credit, and TTL-bounded cache entries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use backend::domain::ports::{
    AccountPersistenceError, AccountRepository, CacheError, CacheKey, KeyValueCache,
    PasswordHasher as PasswordHasherPort, PaymentPersistenceError, PaymentRepository,
    UserPersistenceError, UserRepository,
};
use backend::domain::{
    Account, AccountId, AccountService, AuthService, CacheService, EmailAddress, NewPayment,
    NewUser, Payment, PaymentId, PaymentService, TransactionId, User, UserId, UserService,
    UserUpdate, UserWithAccounts,
};
use backend::inbound::http::HttpState;
use backend::outbound::security::BcryptPasswordHasher;
use backend::outbound::token::JwtTokenCodec;

/// Shared secret used by every suite for webhook signatures.
pub const WEBHOOK_SECRET: &str = "gfdmhghif38yrf9ew0jkf32";
/// Shared secret used for token signing.
pub const TOKEN_SECRET: &str = "09d25e094faa6ca2556c818166b7a9563b93f7099f6f0f4caa6cf63b88e8d3e7";
/// Minimum bcrypt cost keeps hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

#[derive(Default)]
struct State {
    users: Vec<User>,
    accounts: Vec<Account>,
    payments: Vec<Payment>,
    next_user: i32,
    next_account: i32,
    next_payment: i32,
}

/// One in-memory "database" shared by the three repository adapters.
///
/// A single mutex over the whole state makes multi-entity operations
/// transactional by construction, mirroring the database transaction the
/// Diesel adapter uses.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Insert a user directly, bypassing the service layer.
    pub fn seed_user(&self, email: &str, password_hash: &str, is_admin: bool) -> User {
        let mut state = self.state.lock().expect("store poisoned");
        state.next_user += 1;
        let user = User {
            id: UserId::new(state.next_user),
            email: EmailAddress::new(email).expect("valid seed email"),
            full_name: "Seeded User".to_owned(),
            password_hash: backend::domain::PasswordHash::new(password_hash),
            is_admin,
        };
        state.users.push(user.clone());
        user
    }

    /// Insert an account with an explicit starting balance.
    pub fn seed_account(&self, user_id: UserId, balance: Decimal) -> Account {
        let mut state = self.state.lock().expect("store poisoned");
        state.next_account += 1;
        let account = Account {
            id: AccountId::new(state.next_account),
            user_id,
            balance,
        };
        state.accounts.push(account.clone());
        account
    }

    /// Current balance of an account, if it exists.
    pub fn balance_of(&self, id: AccountId) -> Option<Decimal> {
        let state = self.state.lock().expect("store poisoned");
        state
            .accounts
            .iter()
            .find(|account| account.id == id)
            .map(|account| account.balance)
    }

    /// Number of stored payment rows.
    pub fn payment_count(&self) -> usize {
        let state = self.state.lock().expect("store poisoned");
        state.payments.len()
    }

    /// Number of stored accounts.
    pub fn account_count(&self) -> usize {
        let state = self.state.lock().expect("store poisoned");
        state.accounts.len()
    }
}

/// In-memory `UserRepository` adapter.
#[derive(Clone)]
pub struct InMemoryUserRepository(pub Arc<InMemoryStore>);

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserPersistenceError> {
        let mut state = self.0.state.lock().expect("store poisoned");
        if state.users.iter().any(|existing| existing.email == user.email) {
            return Err(UserPersistenceError::duplicate_email(user.email.as_str()));
        }
        state.next_user += 1;
        let created = User {
            id: UserId::new(state.next_user),
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let state = self.0.state.lock().expect("store poisoned");
        Ok(state.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let state = self.0.state.lock().expect("store poisoned");
        Ok(state.users.iter().find(|user| user.email == *email).cloned())
    }

    async fn list_with_accounts(&self) -> Result<Vec<UserWithAccounts>, UserPersistenceError> {
        let state = self.0.state.lock().expect("store poisoned");
        Ok(state
            .users
            .iter()
            .map(|user| UserWithAccounts {
                user: user.clone(),
                accounts: state
                    .accounts
                    .iter()
                    .filter(|account| account.user_id == user.id)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn update(
        &self,
        id: UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut state = self.0.state.lock().expect("store poisoned");
        let Some(index) = state.users.iter().position(|user| user.id == id) else {
            return Ok(None);
        };
        let mut user = state.users[index].clone();
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(full_name) = update.full_name {
            user.full_name = full_name;
        }
        if let Some(password_hash) = update.password_hash {
            user.password_hash = password_hash;
        }
        state.users[index] = user.clone();
        Ok(Some(user))
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError> {
        let mut state = self.0.state.lock().expect("store poisoned");
        let before = state.users.len();
        state.users.retain(|user| user.id != id);
        // Cascade, as the schema would.
        state.accounts.retain(|account| account.user_id != id);
        state.payments.retain(|payment| payment.user_id != id);
        Ok(state.users.len() < before)
    }
}

/// In-memory `AccountRepository` adapter; `adjust_balance` serialises on
/// the store mutex exactly as the row lock does in PostgreSQL.
#[derive(Clone)]
pub struct InMemoryAccountRepository(pub Arc<InMemoryStore>);

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, user_id: UserId) -> Result<Account, AccountPersistenceError> {
        let mut state = self.0.state.lock().expect("store poisoned");
        state.next_account += 1;
        let account = Account {
            id: AccountId::new(state.next_account),
            user_id,
            balance: Decimal::ZERO,
        };
        state.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_by_id(
        &self,
        id: AccountId,
    ) -> Result<Option<Account>, AccountPersistenceError> {
        let state = self.0.state.lock().expect("store poisoned");
        Ok(state.accounts.iter().find(|account| account.id == id).cloned())
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Account>, AccountPersistenceError> {
        let state = self.0.state.lock().expect("store poisoned");
        Ok(state
            .accounts
            .iter()
            .filter(|account| account.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn adjust_balance(
        &self,
        id: AccountId,
        delta: Decimal,
    ) -> Result<Account, AccountPersistenceError> {
        let mut state = self.0.state.lock().expect("store poisoned");
        let Some(index) = state.accounts.iter().position(|account| account.id == id) else {
            return Err(AccountPersistenceError::NotFound { account_id: id });
        };
        let new_balance = state.accounts[index].balance + delta;
        if new_balance < Decimal::ZERO {
            return Err(AccountPersistenceError::BalanceWouldGoNegative { account_id: id });
        }
        state.accounts[index].balance = new_balance;
        Ok(state.accounts[index].clone())
    }
}

/// In-memory `PaymentRepository` adapter; `record` is atomic over the
/// store mutex, like the Diesel transaction.
#[derive(Clone)]
pub struct InMemoryPaymentRepository(pub Arc<InMemoryStore>);

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn find_by_id(
        &self,
        id: PaymentId,
    ) -> Result<Option<Payment>, PaymentPersistenceError> {
        let state = self.0.state.lock().expect("store poisoned");
        Ok(state.payments.iter().find(|payment| payment.id == id).cloned())
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Payment>, PaymentPersistenceError> {
        let state = self.0.state.lock().expect("store poisoned");
        Ok(state
            .payments
            .iter()
            .find(|payment| payment.transaction_id == *transaction_id)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Payment>, PaymentPersistenceError> {
        let state = self.0.state.lock().expect("store poisoned");
        Ok(state
            .payments
            .iter()
            .filter(|payment| payment.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn record(&self, payment: NewPayment) -> Result<Payment, PaymentPersistenceError> {
        let mut state = self.0.state.lock().expect("store poisoned");

        if state
            .payments
            .iter()
            .any(|existing| existing.transaction_id == payment.transaction_id)
        {
            return Err(PaymentPersistenceError::duplicate_transaction(
                payment.transaction_id.as_str(),
            ));
        }

        let Some(index) = state
            .accounts
            .iter()
            .position(|account| account.id == payment.account_id)
        else {
            return Err(PaymentPersistenceError::AccountMissing {
                account_id: payment.account_id,
            });
        };

        let new_balance = state.accounts[index].balance + payment.amount;
        if new_balance < Decimal::ZERO {
            return Err(PaymentPersistenceError::BalanceWouldGoNegative {
                account_id: payment.account_id,
            });
        }

        state.next_payment += 1;
        let recorded = Payment {
            id: PaymentId::new(state.next_payment),
            transaction_id: payment.transaction_id,
            user_id: payment.user_id,
            account_id: payment.account_id,
            amount: payment.amount,
            created_at: Utc::now(),
        };
        state.payments.push(recorded.clone());
        state.accounts[index].balance = new_balance;
        Ok(recorded)
    }
}

/// In-memory `KeyValueCache` with real TTL expiry.
#[derive(Default)]
pub struct InMemoryKeyValueCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryKeyValueCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Raw entry lookup without TTL filtering, for assertions on writes.
    pub fn raw_entry(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().expect("cache poisoned");
        entries.get(key).map(|(value, _)| value.clone())
    }
}

#[async_trait]
impl KeyValueCache for InMemoryKeyValueCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().expect("cache poisoned");
        match entries.get(key.as_str()) {
            Some((value, deadline)) if Instant::now() < *deadline => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key.as_str());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().expect("cache poisoned");
        entries.insert(
            key.as_str().to_owned(),
            (value.to_owned(), Instant::now() + ttl),
        );
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().expect("cache poisoned");
        entries.remove(key.as_str());
        Ok(())
    }
}

/// Everything a suite needs: the store, the cache, and the wired services.
pub struct TestBackend {
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<InMemoryKeyValueCache>,
    pub hasher: Arc<BcryptPasswordHasher>,
    pub tokens: Arc<JwtTokenCodec>,
    pub auth:
        Arc<AuthService<InMemoryUserRepository, BcryptPasswordHasher, JwtTokenCodec>>,
    pub users: Arc<
        UserService<InMemoryUserRepository, BcryptPasswordHasher, InMemoryKeyValueCache>,
    >,
    pub accounts: Arc<AccountService<InMemoryAccountRepository, InMemoryKeyValueCache>>,
    pub payments: Arc<
        PaymentService<
            InMemoryPaymentRepository,
            InMemoryAccountRepository,
            InMemoryKeyValueCache,
        >,
    >,
}

impl TestBackend {
    /// Wire every service over fresh in-memory adapters.
    pub fn new() -> Self {
        Self::with_cache_ttl(Duration::from_secs(300))
    }

    /// Same as [`Self::new`] with an explicit cache TTL, for expiry tests.
    pub fn with_cache_ttl(cache_ttl: Duration) -> Self {
        let store = InMemoryStore::new();
        let cache = InMemoryKeyValueCache::new();
        let cache_service = CacheService::new(Arc::clone(&cache), cache_ttl);

        let user_repo = Arc::new(InMemoryUserRepository(Arc::clone(&store)));
        let account_repo = Arc::new(InMemoryAccountRepository(Arc::clone(&store)));
        let payment_repo = Arc::new(InMemoryPaymentRepository(Arc::clone(&store)));

        let hasher = Arc::new(BcryptPasswordHasher::with_cost(TEST_BCRYPT_COST));
        let tokens = Arc::new(JwtTokenCodec::new(TOKEN_SECRET));

        let auth = Arc::new(AuthService::new(
            Arc::clone(&user_repo),
            Arc::clone(&hasher),
            Arc::clone(&tokens),
            Duration::from_secs(1800),
        ));
        let users = Arc::new(UserService::new(
            Arc::clone(&user_repo),
            Arc::clone(&hasher),
            cache_service.clone(),
        ));
        let accounts = Arc::new(AccountService::new(
            Arc::clone(&account_repo),
            cache_service.clone(),
        ));
        let payments = Arc::new(PaymentService::new(
            payment_repo,
            account_repo,
            cache_service,
            WEBHOOK_SECRET,
        ));

        Self {
            store,
            cache,
            hasher,
            tokens,
            auth,
            users,
            accounts,
            payments,
        }
    }

    /// HTTP state bundle over the wired services.
    pub fn http_state(&self) -> HttpState {
        HttpState {
            login: self.auth.clone(),
            users_query: self.users.clone(),
            users_command: self.users.clone(),
            accounts: self.accounts.clone(),
            payment_webhook: self.payments.clone(),
            payments_query: self.payments.clone(),
            tokens: self.tokens.clone(),
        }
    }

    /// Seed a user whose password is hashed with the test cost factor.
    pub fn seed_user_with_password(&self, email: &str, password: &str, is_admin: bool) -> User {
        let digest = self
            .hasher
            .hash(password)
            .expect("test hashing succeeds");
        self.store.seed_user(email, digest.as_str(), is_admin)
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the webhook signature exactly as the processor would.
pub fn signature_for(
    account_id: AccountId,
    amount: Decimal,
    transaction_id: &str,
    user_id: UserId,
) -> String {
    let data = format!("{account_id}{amount}{transaction_id}{user_id}{WEBHOOK_SECRET}");
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// A fully signed webhook payload for the given coordinates.
pub fn signed_payload(
    transaction_id: &str,
    user_id: UserId,
    account_id: AccountId,
    amount: Decimal,
) -> backend::domain::WebhookPayload {
    backend::domain::WebhookPayload {
        transaction_id: TransactionId::new(transaction_id).expect("valid transaction id"),
        user_id,
        account_id,
        amount,
        signature: signature_for(account_id, amount, transaction_id, user_id),
    }
}
