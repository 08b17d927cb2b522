//! User data model.
//!
//! Purpose: strongly typed user identity shared by the services and the
//! persistence adapter. Invariants and serialisation contracts live here so
//! inbound payload parsing stays outside the domain.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::account::Account;

/// Validation errors returned by the user newtype constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// Email was blank once trimmed.
    EmptyEmail,
    /// Email contained surrounding whitespace or no `@` separating two
    /// non-empty parts.
    InvalidEmail,
    /// Full name was blank once trimmed.
    EmptyFullName,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must contain a local part and a domain"),
            Self::EmptyFullName => write!(f, "full name must not be empty"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier assigned by the database sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    /// Wrap a database-assigned identifier.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Access the raw integer identifier.
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique, trimmed email address.
///
/// Full RFC 5322 validation belongs to the mail infrastructure; the domain
/// only enforces the shape it relies on for lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`].
    ///
    /// # Examples
    /// ```
    /// use backend::domain::EmailAddress;
    ///
    /// let email = EmailAddress::new("ada@example.com").expect("valid email");
    /// assert_eq!(email.as_str(), "ada@example.com");
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidEmail);
        }
        let (local, domain) = raw.split_once('@').ok_or(UserValidationError::InvalidEmail)?;
        if local.is_empty() || domain.is_empty() {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(raw))
    }

    /// Borrow the underlying address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Opaque one-way password digest produced by the credential hasher.
///
/// Never printed or serialised; the `Debug` impl redacts the content.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a digest produced by a `PasswordHasher` adapter or loaded from
    /// storage.
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    /// Borrow the digest for verification or persistence.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Database-assigned identifier.
    pub id: UserId,
    /// Unique login email.
    pub email: EmailAddress,
    /// Display name supplied at registration.
    pub full_name: String,
    /// One-way password digest.
    pub password_hash: PasswordHash,
    /// Grants access to the administrative endpoints.
    pub is_admin: bool,
}

/// Fields required to register a user; the id is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login email.
    pub email: EmailAddress,
    /// Display name.
    pub full_name: String,
    /// Digest produced by the credential hasher.
    pub password_hash: PasswordHash,
    /// Administrative flag.
    pub is_admin: bool,
}

/// Typed partial update with explicit presence tracking.
///
/// `None` means "leave unchanged"; only supplied fields reach storage.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    /// Replacement email, if supplied.
    pub email: Option<EmailAddress>,
    /// Replacement display name, if supplied.
    pub full_name: Option<String>,
    /// Replacement plaintext password; re-hashed by the user service before
    /// it reaches storage.
    pub password: Option<String>,
}

impl UserPatch {
    /// True when no field is supplied.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.full_name.is_none() && self.password.is_none()
    }
}

/// Storage-level change set derived from a [`UserPatch`] after hashing.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// Replacement email, if supplied.
    pub email: Option<EmailAddress>,
    /// Replacement display name, if supplied.
    pub full_name: Option<String>,
    /// Replacement password digest, if the patch carried a password.
    pub password_hash: Option<PasswordHash>,
}

/// A user together with the accounts they own, for the admin listing.
#[derive(Debug, Clone, PartialEq)]
pub struct UserWithAccounts {
    /// The owning user.
    pub user: User,
    /// Accounts owned by the user; empty when none exist.
    pub accounts: Vec<Account>,
}
