//! Payments API handlers.
//!
//! ```text
//! POST /api/v1/payments/webhook
//! GET  /api/v1/payments/my
//! ```
//!
//! The webhook endpoint is unauthenticated by design: the shared-secret
//! signature inside the payload is the processor's credential.

use actix_web::{get, post, web};

use crate::domain::WebhookPayload;

use super::auth::AuthenticatedUser;
use super::error::{ApiError, ApiResult};
use super::schemas::{PaymentResponse, WebhookRequest};
use super::state::HttpState;

/// Ingest one webhook delivery from the payment processor.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body = WebhookRequest,
    responses(
        (status = 200, description = "Recorded payment", body = PaymentResponse),
        (
            status = 400,
            description = "Invalid signature / Transaction already processed",
            body = ApiError
        )
    ),
    tags = ["payments"],
    operation_id = "processPaymentWebhook",
    security([])
)]
#[post("/payments/webhook")]
pub async fn process_payment_webhook(
    state: web::Data<HttpState>,
    payload: web::Json<WebhookRequest>,
) -> ApiResult<web::Json<PaymentResponse>> {
    let payload = WebhookPayload::try_from(payload.into_inner())?;
    let payment = state.payment_webhook.process_payment(payload).await?;
    Ok(web::Json(payment.into()))
}

/// List the payments credited to the authenticated caller.
#[utoipa::path(
    get,
    path = "/api/v1/payments/my",
    responses(
        (status = 200, description = "Payments of the current user", body = [PaymentResponse]),
        (status = 401, description = "Unauthorised", body = ApiError)
    ),
    tags = ["payments"],
    operation_id = "getUserPayments"
)]
#[get("/payments/my")]
pub async fn get_user_payments(
    user: AuthenticatedUser,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<PaymentResponse>>> {
    let payments = state.payments_query.payments_for_user(user.0.id).await?;
    Ok(web::Json(payments.into_iter().map(Into::into).collect()))
}
