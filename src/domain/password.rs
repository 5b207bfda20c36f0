//! Argon2 password hashing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::config::MIN_PASSWORD_LENGTH;
use crate::errors::{AppError, AppResult};

/// A salted Argon2 hash in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl std::fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HashedPassword([REDACTED])")
    }
}

impl HashedPassword {
    /// Hash a plain-text password.
    ///
    /// # Errors
    /// `Validation` if the password is shorter than [`MIN_PASSWORD_LENGTH`].
    pub fn hash(plain_text: &str) -> AppResult<Self> {
        if plain_text.len() < MIN_PASSWORD_LENGTH {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?;

        Ok(Self(hash.to_string()))
    }

    /// Wrap a hash loaded from storage.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Check a plain-text password. Malformed hashes never verify.
    pub fn verify(&self, plain_text: &str) -> bool {
        match PasswordHash::new(&self.0) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::debug!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = HashedPassword::hash("correct horse battery").unwrap();

        assert!(hashed.verify("correct horse battery"));
        assert!(!hashed.verify("wrong horse battery"));
    }

    #[test]
    fn same_input_gets_a_fresh_salt() {
        let first = HashedPassword::hash("SamePassword123").unwrap();
        let second = HashedPassword::hash("SamePassword123").unwrap();

        assert_ne!(first, second);
        assert!(HashedPassword::from_stored(second.into_string()).verify("SamePassword123"));
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(matches!(
            HashedPassword::hash("short"),
            Err(AppError::Validation(_))
        ));
        assert!(HashedPassword::hash("12345678").is_ok());
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!HashedPassword::from_stored("not-a-phc-string").verify("anything"));
    }

    #[test]
    fn debug_redacts_hash() {
        let hashed = HashedPassword::from_stored("$argon2id$v=19$secret");
        assert_eq!(format!("{:?}", hashed), "HashedPassword([REDACTED])");
    }
}
