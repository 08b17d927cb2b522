//! Credential hashing adapter (bcrypt).

use bcrypt::DEFAULT_COST;
use tracing::warn;

use crate::domain::ports::{PasswordHashError, PasswordHasher};
use crate::domain::PasswordHash;

/// Bcrypt-backed implementation of the `PasswordHasher` port.
///
/// Hashing is salted and deliberately expensive; the cost factor is the
/// crate default unless overridden for tests.
#[derive(Debug, Clone)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Hasher with the production cost factor.
    pub fn new() -> Self {
        Self { cost: DEFAULT_COST }
    }

    /// Hasher with an explicit cost factor.
    ///
    /// Tests use the minimum cost so suites stay fast; production code
    /// should stick to [`Self::new`].
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHashError> {
        bcrypt::hash(plaintext, self.cost)
            .map(PasswordHash::new)
            .map_err(|err| PasswordHashError::new(err.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &PasswordHash) -> bool {
        match bcrypt::verify(plaintext, digest.as_str()) {
            Ok(matched) => matched,
            Err(err) => {
                // A malformed digest is a verification failure, never an
                // error surfaced to callers.
                warn!(error = %err, "password digest failed to parse");
                false
            }
        }
    }
}
