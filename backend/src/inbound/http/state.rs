//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.
//! The composition root in `server` builds the concrete services once and
//! injects them here; no handler reaches for a global.

use std::sync::Arc;

use crate::domain::ports::{
    AccountsQuery, LoginService, PaymentWebhook, PaymentsQuery, TokenCodec, UsersCommand,
    UsersQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Credential exchange for `POST /auth/token`.
    pub login: Arc<dyn LoginService>,
    /// User read models, also used by the bearer extractor.
    pub users_query: Arc<dyn UsersQuery>,
    /// User mutations behind the admin gate.
    pub users_command: Arc<dyn UsersCommand>,
    /// Account listings for the current user.
    pub accounts: Arc<dyn AccountsQuery>,
    /// The webhook ingestion pipeline.
    pub payment_webhook: Arc<dyn PaymentWebhook>,
    /// Payment listings for the current user.
    pub payments_query: Arc<dyn PaymentsQuery>,
    /// Token validation for the bearer extractor.
    pub tokens: Arc<dyn TokenCodec>,
}
