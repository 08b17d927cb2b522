//! Cache serialisation fidelity and read-through/invalidation behaviour.

mod support;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use backend::domain::cache_keys;
use backend::domain::ports::PaymentWebhook;
use backend::domain::{
    Account, AccountId, CacheService, Payment, PaymentId, TransactionId, UserId,
};

use support::{InMemoryKeyValueCache, TestBackend, signed_payload};

fn sample_payment() -> Payment {
    Payment {
        id: PaymentId::new(1),
        transaction_id: TransactionId::new("tx1").expect("valid id"),
        user_id: UserId::new(1),
        account_id: AccountId::new(1),
        amount: Decimal::new(10_050, 2),
        created_at: DateTime::parse_from_rfc3339("2026-01-02T03:04:05.123456Z")
            .expect("valid timestamp")
            .with_timezone(&Utc),
    }
}

#[tokio::test]
async fn payment_round_trips_with_exact_decimal_and_timestamp() {
    let cache = InMemoryKeyValueCache::new();
    let service = CacheService::new(Arc::clone(&cache), Duration::from_secs(300));
    let key = cache_keys::payment(PaymentId::new(1));
    let payment = sample_payment();

    service.set_json(&key, &payment).await;
    let loaded: Payment = service.get_json(&key).await.expect("entry present");

    assert_eq!(loaded, payment);
    assert_eq!(loaded.amount.to_string(), "100.50");
    assert_eq!(loaded.created_at, payment.created_at);

    // The wire form keeps the decimal as a string, never binary floating
    // point.
    let raw = cache.raw_entry(key.as_str()).expect("raw entry present");
    assert!(raw.contains("\"100.50\""));
}

#[tokio::test]
async fn account_list_round_trips_deep_equal() {
    let cache = InMemoryKeyValueCache::new();
    let service = CacheService::new(Arc::clone(&cache), Duration::from_secs(300));
    let key = cache_keys::user_accounts(UserId::new(1));
    let accounts = vec![
        Account {
            id: AccountId::new(1),
            user_id: UserId::new(1),
            balance: Decimal::new(10_050, 2),
        },
        Account {
            id: AccountId::new(2),
            user_id: UserId::new(1),
            balance: Decimal::ZERO,
        },
    ];

    service.set_json(&key, &accounts).await;
    let loaded: Vec<Account> = service.get_json(&key).await.expect("entry present");
    assert_eq!(loaded, accounts);
}

#[tokio::test]
async fn expired_entries_read_as_misses() {
    let cache = InMemoryKeyValueCache::new();
    let service = CacheService::new(Arc::clone(&cache), Duration::from_millis(20));
    let key = cache_keys::payment(PaymentId::new(1));

    service.set_json(&key, &sample_payment()).await;
    tokio::time::sleep(Duration::from_millis(40)).await;

    let loaded: Option<Payment> = service.get_json(&key).await;
    assert!(loaded.is_none(), "expired entry must miss");
}

#[tokio::test]
async fn account_listing_populates_and_reuses_the_cache() {
    let backend = TestBackend::new();
    let user = backend.store.seed_user("ada@example.com", "digest", false);
    backend.store.seed_account(user.id, Decimal::new(10_050, 2));

    let first = backend
        .accounts
        .get_accounts_by_user(user.id)
        .await
        .expect("listing succeeds");
    assert_eq!(first.len(), 1);

    let key = cache_keys::user_accounts(user.id);
    assert!(
        backend.cache.raw_entry(key.as_str()).is_some(),
        "read-through must populate the cache"
    );

    let second = backend
        .accounts
        .get_accounts_by_user(user.id)
        .await
        .expect("listing succeeds");
    assert_eq!(second, first);
}

#[tokio::test]
async fn processing_a_payment_invalidates_the_account_list_and_caches_the_payment() {
    let backend = TestBackend::new();
    let user = backend.store.seed_user("ada@example.com", "digest", false);
    let account = backend.store.seed_account(user.id, Decimal::ZERO);

    // Warm the account list cache, then process a payment.
    backend
        .accounts
        .get_accounts_by_user(user.id)
        .await
        .expect("listing succeeds");
    let list_key = cache_keys::user_accounts(user.id);
    assert!(backend.cache.raw_entry(list_key.as_str()).is_some());

    let payment = backend
        .payments
        .process_payment(signed_payload(
            "tx1",
            user.id,
            account.id,
            Decimal::new(10_050, 2),
        ))
        .await
        .expect("pipeline succeeds");

    // Stale list dropped; fresh single-payment entry populated.
    assert!(
        backend.cache.raw_entry(list_key.as_str()).is_none(),
        "account list must be invalidated after a credit"
    );
    let payment_key = cache_keys::payment(payment.id);
    assert!(backend.cache.raw_entry(payment_key.as_str()).is_some());

    // A fresh listing reflects the credited balance, not the stale cache.
    let accounts = backend
        .accounts
        .get_accounts_by_user(user.id)
        .await
        .expect("listing succeeds");
    assert_eq!(accounts[0].balance, Decimal::new(10_050, 2));
}

#[tokio::test]
async fn cached_payment_reads_skip_storage() {
    let backend = TestBackend::new();
    let user = backend.store.seed_user("ada@example.com", "digest", false);
    let account = backend.store.seed_account(user.id, Decimal::ZERO);

    let recorded = backend
        .payments
        .process_payment(signed_payload(
            "tx1",
            user.id,
            account.id,
            Decimal::new(10_050, 2),
        ))
        .await
        .expect("pipeline succeeds");

    let fetched = backend
        .payments
        .get_payment(recorded.id)
        .await
        .expect("lookup succeeds")
        .expect("payment present");
    assert_eq!(fetched, recorded);
}
