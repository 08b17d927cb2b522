//! Domain primitives, aggregates, services, and ports.
//!
//! Purpose: keep the business rules of the payment-account system free of
//! transport and storage concerns. Adapters on both sides talk to this
//! module exclusively through the traits in [`ports`] and the types
//! re-exported here.

pub mod account;
pub mod account_service;
pub mod auth;
pub mod auth_service;
pub mod cache;
pub mod cache_keys;
pub mod error;
pub mod payment;
pub mod payment_service;
pub mod ports;
pub mod user;
pub mod user_service;

pub use self::account::{Account, AccountId};
pub use self::account_service::AccountService;
pub use self::auth::{AccessToken, LoginCredentials, LoginValidationError};
pub use self::auth_service::{AuthService, require_admin};
pub use self::cache::CacheService;
pub use self::error::{DomainError, DomainErrorValidationError, ErrorCode};
pub use self::payment::{
    NewPayment, Payment, PaymentId, TransactionId, TransactionIdValidationError, WebhookPayload,
};
pub use self::payment_service::{DUPLICATE_TRANSACTION, INVALID_SIGNATURE, PaymentService};
pub use self::user::{
    EmailAddress, NewUser, PasswordHash, User, UserId, UserPatch, UserUpdate,
    UserValidationError, UserWithAccounts,
};
pub use self::user_service::UserService;

/// Convenient result alias for domain operations.
///
/// # Examples
/// ```
/// use backend::domain::{ApiResult, DomainError};
///
/// fn refuse() -> ApiResult<()> {
///     Err(DomainError::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, DomainError>;
