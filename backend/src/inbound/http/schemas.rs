//! Request/response DTOs shared by the HTTP handlers.
//!
//! Domain aggregates never serialise straight onto the wire: the DTOs here
//! pick the exposed fields (no password digests) and pin the JSON contract
//! independently of domain refactors.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    Account, AccountId, DomainError, EmailAddress, Payment, PaymentId, TransactionId, User,
    UserId, UserPatch, UserWithAccounts, WebhookPayload,
};

use super::error::ApiError;

/// A user as exposed over HTTP (digest omitted).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    /// Database-assigned identifier.
    #[schema(value_type = i32)]
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Administrative flag.
    pub is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.into(),
            full_name: user.full_name,
            is_admin: user.is_admin,
        }
    }
}

/// An account as exposed over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    /// Database-assigned identifier.
    #[schema(value_type = i32)]
    pub id: AccountId,
    /// Owning user.
    #[schema(value_type = i32)]
    pub user_id: UserId,
    /// Current balance as an exact decimal string.
    #[schema(value_type = String, example = "100.50")]
    pub balance: Decimal,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            user_id: account.user_id,
            balance: account.balance,
        }
    }
}

/// A user with owned accounts, for the admin listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserWithAccountsResponse {
    /// Database-assigned identifier.
    #[schema(value_type = i32)]
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Administrative flag.
    pub is_admin: bool,
    /// Accounts owned by the user.
    pub accounts: Vec<AccountResponse>,
}

impl From<UserWithAccounts> for UserWithAccountsResponse {
    fn from(value: UserWithAccounts) -> Self {
        Self {
            id: value.user.id,
            email: value.user.email.into(),
            full_name: value.user.full_name,
            is_admin: value.user.is_admin,
            accounts: value.accounts.into_iter().map(Into::into).collect(),
        }
    }
}

/// Body for `POST /api/v1/users`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Unique login email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Plaintext password, hashed before persistence.
    pub password: String,
}

impl CreateUserRequest {
    /// Validate the email shape before the request reaches the domain.
    pub fn validated_email(&self) -> Result<EmailAddress, ApiError> {
        EmailAddress::new(self.email.as_str()).map_err(|err| {
            ApiError::from(
                DomainError::invalid_request(err.to_string())
                    .with_details(json!({ "field": "email" })),
            )
        })
    }
}

/// Body for `PUT /api/v1/users/{id}`; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    /// Replacement email, if supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Replacement display name, if supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Replacement password, if supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl TryFrom<UpdateUserRequest> for UserPatch {
    type Error = ApiError;

    fn try_from(value: UpdateUserRequest) -> Result<Self, Self::Error> {
        let email = value
            .email
            .map(EmailAddress::new)
            .transpose()
            .map_err(|err| {
                ApiError::from(
                    DomainError::invalid_request(err.to_string())
                        .with_details(json!({ "field": "email" })),
                )
            })?;

        Ok(Self {
            email,
            full_name: value.full_name,
            password: value.password,
        })
    }
}

/// Body for `POST /api/v1/payments/webhook`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookRequest {
    /// Processor transaction identifier (idempotency key).
    pub transaction_id: String,
    /// Claimed user to credit.
    pub user_id: i32,
    /// Claimed account to credit.
    pub account_id: i32,
    /// Signed amount; decimal strings preserve exact scale.
    #[schema(value_type = String, example = "100.50")]
    pub amount: Decimal,
    /// Hex-encoded SHA-256 signature.
    pub signature: String,
}

impl TryFrom<WebhookRequest> for WebhookPayload {
    type Error = ApiError;

    fn try_from(value: WebhookRequest) -> Result<Self, Self::Error> {
        let transaction_id = TransactionId::new(value.transaction_id).map_err(|err| {
            ApiError::from(
                DomainError::invalid_request(err.to_string())
                    .with_details(json!({ "field": "transaction_id" })),
            )
        })?;

        Ok(Self {
            transaction_id,
            user_id: UserId::new(value.user_id),
            account_id: AccountId::new(value.account_id),
            amount: value.amount,
            signature: value.signature,
        })
    }
}

/// A payment as exposed over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    /// Database-assigned identifier.
    #[schema(value_type = i32)]
    pub id: PaymentId,
    /// Processor transaction identifier.
    pub transaction_id: String,
    /// Credited user.
    #[schema(value_type = i32)]
    pub user_id: UserId,
    /// Credited account (after resolution).
    #[schema(value_type = i32)]
    pub account_id: AccountId,
    /// Signed amount as an exact decimal string.
    #[schema(value_type = String, example = "100.50")]
    pub amount: Decimal,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            transaction_id: payment.transaction_id.into(),
            user_id: payment.user_id,
            account_id: payment.account_id,
            amount: payment.amount,
            created_at: payment.created_at,
        }
    }
}

/// Simple acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human readable confirmation.
    pub message: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process serves traffic.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PasswordHash;
    use rstest::rstest;

    #[rstest]
    fn user_response_omits_the_digest() {
        let user = User {
            id: UserId::new(1),
            email: EmailAddress::new("ada@example.com").expect("valid email"),
            full_name: "Ada Lovelace".to_owned(),
            password_hash: PasswordHash::new("$2b$12$digest"),
            is_admin: true,
        };

        let json = serde_json::to_value(UserResponse::from(user)).expect("serialises");
        assert_eq!(json["email"], "ada@example.com");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("hashed_password").is_none());
    }

    #[rstest]
    fn webhook_request_accepts_decimal_strings() {
        let request: WebhookRequest = serde_json::from_value(json!({
            "transaction_id": "tx1",
            "user_id": 1,
            "account_id": 1,
            "amount": "100.50",
            "signature": "sig"
        }))
        .expect("deserialises");

        let payload = WebhookPayload::try_from(request).expect("converts");
        assert_eq!(payload.amount.to_string(), "100.50");
    }

    #[rstest]
    fn blank_transaction_id_is_rejected_at_the_edge() {
        let request: WebhookRequest = serde_json::from_value(json!({
            "transaction_id": "   ",
            "user_id": 1,
            "account_id": 1,
            "amount": "1.00",
            "signature": "sig"
        }))
        .expect("deserialises");

        let err = WebhookPayload::try_from(request).expect_err("must fail");
        assert_eq!(err.code(), crate::domain::ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn update_request_with_bad_email_fails_conversion() {
        let request = UpdateUserRequest {
            email: Some("not-an-email".to_owned()),
            ..UpdateUserRequest::default()
        };
        assert!(UserPatch::try_from(request).is_err());
    }
}
