//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations exactly; Diesel uses them
//! for compile-time query validation and type-safe SQL generation.

diesel::table! {
    /// Registered users.
    users (id) {
        /// Primary key (serial).
        id -> Int4,
        /// Unique login email.
        email -> Varchar,
        /// Display name supplied at registration.
        full_name -> Varchar,
        /// One-way password digest.
        hashed_password -> Varchar,
        /// Grants access to the administrative endpoints.
        is_admin -> Bool,
    }
}

diesel::table! {
    /// Monetary accounts, each owned by one user.
    accounts (id) {
        /// Primary key (serial).
        id -> Int4,
        /// Owning user (cascade delete).
        user_id -> Int4,
        /// Fixed-point balance, constrained non-negative.
        balance -> Numeric,
    }
}

diesel::table! {
    /// Immutable records of processed webhook deliveries.
    payments (id) {
        /// Primary key (serial).
        id -> Int4,
        /// Processor transaction identifier (unique).
        transaction_id -> Varchar,
        /// Credited user (cascade delete).
        user_id -> Int4,
        /// Credited account (cascade delete).
        account_id -> Int4,
        /// Signed fixed-point amount.
        amount -> Numeric,
        /// Server-assigned creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(accounts -> users (user_id));
diesel::joinable!(payments -> users (user_id));
diesel::joinable!(payments -> accounts (account_id));

diesel::allow_tables_to_appear_in_same_query!(users, accounts, payments);
