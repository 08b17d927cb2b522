//! Payment webhook pipeline and payment read models.
//!
//! The pipeline is the serialisation-sensitive core of the system:
//! signature verification, idempotent recording, account resolution, and
//! balance credit. Ordering matters — nothing is persisted before the
//! signature and replay checks pass, and the record-plus-credit pair
//! commits as one unit inside the repository adapter.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use super::account::AccountId;
use super::account_service::map_account_persistence_error;
use super::cache::CacheService;
use super::cache_keys::{self, WriteOp};
use super::error::DomainError;
use super::payment::{NewPayment, Payment, PaymentId, TransactionId, WebhookPayload};
use super::ports::{
    AccountRepository, KeyValueCache, PaymentPersistenceError, PaymentRepository, PaymentWebhook,
    PaymentsQuery,
};
use super::user::UserId;

/// Stable message returned when the supplied signature does not verify.
pub const INVALID_SIGNATURE: &str = "Invalid signature";
/// Stable message returned when the transaction id was already recorded.
pub const DUPLICATE_TRANSACTION: &str = "Transaction already processed";

fn map_payment_persistence_error(error: PaymentPersistenceError) -> DomainError {
    match error {
        PaymentPersistenceError::Connection { message } => {
            DomainError::service_unavailable(message)
        }
        PaymentPersistenceError::Query { message } => DomainError::internal(message),
        // A concurrent duplicate insert and a pre-check hit must be
        // indistinguishable to the sender.
        PaymentPersistenceError::DuplicateTransaction { .. } => {
            DomainError::invalid_request(DUPLICATE_TRANSACTION)
        }
        PaymentPersistenceError::AccountMissing { account_id } => {
            DomainError::internal(format!("account {account_id} vanished during recording"))
        }
        PaymentPersistenceError::BalanceWouldGoNegative { .. } => {
            DomainError::invalid_request("Account balance cannot be negative")
        }
    }
}

/// Payment service over the payment and account repositories, the cache,
/// and the webhook shared secret.
#[derive(Clone)]
pub struct PaymentService<P, A, C> {
    payments: Arc<P>,
    accounts: Arc<A>,
    cache: CacheService<C>,
    webhook_secret: String,
}

impl<P, A, C> PaymentService<P, A, C>
where
    P: PaymentRepository,
    A: AccountRepository,
    C: KeyValueCache,
{
    /// Create the service with its collaborators and the shared secret the
    /// processor signs deliveries with.
    pub fn new(
        payments: Arc<P>,
        accounts: Arc<A>,
        cache: CacheService<C>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            payments,
            accounts,
            cache,
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Recompute the delivery signature and compare it to the supplied one.
    ///
    /// The digest covers the canonical decimal/text renderings of
    /// `account_id`, `amount`, `transaction_id`, and `user_id` — in that
    /// fixed order — followed by the shared secret, hex-encoded.
    pub fn verify_signature(&self, payload: &WebhookPayload) -> bool {
        let data = format!(
            "{}{}{}{}{}",
            payload.account_id,
            payload.amount,
            payload.transaction_id,
            payload.user_id,
            self.webhook_secret,
        );
        let calculated = hex::encode(Sha256::digest(data.as_bytes()));
        calculated == payload.signature
    }

    /// Resolve the account to credit.
    ///
    /// The claimed account is used only when it exists and belongs to the
    /// payload's user; otherwise a fresh zero-balance account is opened for
    /// that user. Mismatched ownership is treated as "no usable account",
    /// not as an error.
    async fn resolve_account(
        &self,
        claimed: AccountId,
        user_id: UserId,
    ) -> Result<AccountId, DomainError> {
        let existing = self
            .accounts
            .find_by_id(claimed)
            .await
            .map_err(map_account_persistence_error)?;

        if let Some(account) = existing {
            if account.user_id == user_id {
                return Ok(account.id);
            }
        }

        info!(user_id = %user_id, claimed_account = %claimed, "opening new account for payment");
        let account = self
            .accounts
            .create(user_id)
            .await
            .map_err(map_account_persistence_error)?;
        self.cache.invalidate(WriteOp::AccountOpened { user_id }).await;
        Ok(account.id)
    }

    /// Fetch a payment by identifier through the read cache.
    pub async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, DomainError> {
        let key = cache_keys::payment(id);
        if let Some(cached) = self.cache.get_json::<Payment>(&key).await {
            return Ok(Some(cached));
        }

        let payment = self
            .payments
            .find_by_id(id)
            .await
            .map_err(map_payment_persistence_error)?;

        if let Some(payment) = &payment {
            self.cache.set_json(&key, payment).await;
        }
        Ok(payment)
    }

    /// Fetch a payment by its processor transaction identifier.
    pub async fn get_payment_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Payment>, DomainError> {
        self.payments
            .find_by_transaction_id(transaction_id)
            .await
            .map_err(map_payment_persistence_error)
    }

    /// Sum of all payment amounts credited to the user.
    pub async fn total_payments_amount(&self, user_id: UserId) -> Result<Decimal, DomainError> {
        let payments = self
            .payments
            .list_by_user(user_id)
            .await
            .map_err(map_payment_persistence_error)?;
        Ok(payments.iter().map(|payment| payment.amount).sum())
    }
}

#[async_trait]
impl<P, A, C> PaymentWebhook for PaymentService<P, A, C>
where
    P: PaymentRepository,
    A: AccountRepository,
    C: KeyValueCache,
{
    async fn process_payment(&self, payload: WebhookPayload) -> Result<Payment, DomainError> {
        info!(transaction_id = %payload.transaction_id, "processing payment webhook");

        if !self.verify_signature(&payload) {
            error!(transaction_id = %payload.transaction_id, "invalid webhook signature");
            return Err(DomainError::invalid_request(INVALID_SIGNATURE));
        }

        // Friendly replay check; the unique constraint inside `record` is
        // the guarantee under concurrent duplicate delivery.
        let existing = self
            .payments
            .find_by_transaction_id(&payload.transaction_id)
            .await
            .map_err(map_payment_persistence_error)?;
        if existing.is_some() {
            warn!(transaction_id = %payload.transaction_id, "duplicate webhook delivery");
            return Err(DomainError::invalid_request(DUPLICATE_TRANSACTION));
        }

        let account_id = self
            .resolve_account(payload.account_id, payload.user_id)
            .await?;

        let payment = self
            .payments
            .record(NewPayment {
                transaction_id: payload.transaction_id.clone(),
                user_id: payload.user_id,
                account_id,
                amount: payload.amount,
            })
            .await
            .map_err(map_payment_persistence_error)?;

        self.cache
            .set_json(&cache_keys::payment(payment.id), &payment)
            .await;
        self.cache
            .invalidate(WriteOp::PaymentRecorded {
                user_id: payment.user_id,
                account_id: payment.account_id,
            })
            .await;

        info!(
            transaction_id = %payment.transaction_id,
            payment_id = %payment.id,
            "payment processed"
        );
        Ok(payment)
    }
}

#[async_trait]
impl<P, A, C> PaymentsQuery for PaymentService<P, A, C>
where
    P: PaymentRepository,
    A: AccountRepository,
    C: KeyValueCache,
{
    async fn payments_for_user(&self, user_id: UserId) -> Result<Vec<Payment>, DomainError> {
        let payments = self
            .payments
            .list_by_user(user_id)
            .await
            .map_err(map_payment_persistence_error)?;
        info!(user_id = %user_id, count = payments.len(), "listed payments");
        Ok(payments)
    }
}
