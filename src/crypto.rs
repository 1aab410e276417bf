//! Password hashing and opaque identifiers.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use rand::RngCore;
use rand::rngs::OsRng;

const ID_LENGTH: usize = 16; // bytes, before hex encoding.

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
}

/// Generate a random hex identifier.
///
/// Used for user ids, security stamps and `jti` claims.
pub fn random_hex() -> String {
    let mut bytes = [0u8; ID_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification, and owns the account password policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct PasswordManager;

impl PasswordManager {
    /// Hash password using Argon2id.
    pub fn hash_password(&self, password: impl AsRef<[u8]>) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verify password against a PHC string.
    ///
    /// An unparsable stored hash verifies as `false`.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_hash: &str,
    ) -> bool {
        PasswordHash::new(phc_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_ref(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Check a candidate password against the account policy.
    ///
    /// Returns one description per unmet requirement, empty when the
    /// password is acceptable.
    pub fn check_policy(&self, password: &str) -> Vec<&'static str> {
        let mut failures = Vec::new();

        if password.len() < 6 {
            failures.push("Passwords must be at least 6 characters.");
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            failures.push("Passwords must have at least one digit ('0'-'9').");
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            failures
                .push("Passwords must have at least one lowercase ('a'-'z').");
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            failures
                .push("Passwords must have at least one uppercase ('A'-'Z').");
        }
        if password.chars().all(|c| c.is_ascii_alphanumeric()) {
            failures.push(
                "Passwords must have at least one non alphanumeric character.",
            );
        }

        failures
    }
}
