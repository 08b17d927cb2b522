//! PostgreSQL persistence adapters (Diesel, async via `diesel-async`).

mod diesel_account_repository;
mod diesel_error_mapping;
mod diesel_payment_repository;
mod diesel_user_repository;
pub(crate) mod models;
pub mod pool;
pub mod schema;

pub use diesel_account_repository::DieselAccountRepository;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
