//! Argon2id password hashing for staff accounts.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use wardbook_application::PasswordHasher as PasswordHasherPort;
use wardbook_core::{AppError, AppResult};

// m=19 MiB, t=2, p=1
const MEMORY_COST_KIB: u32 = 19_456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

/// Argon2id hasher producing PHC-format hash strings.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Creates a hasher with the account hashing cost parameters.
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
            .unwrap_or_else(|_| Params::default());

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasherPort for Argon2PasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| AppError::Internal(format!("failed to hash password: {error}")))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let stored = PasswordHash::new(hash).map_err(|error| {
            AppError::Internal(format!("stored password hash is malformed: {error}"))
        })?;

        match self.argon2.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(error) => Err(AppError::Internal(format!(
                "password verification failed: {error}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use wardbook_application::PasswordHasher as PasswordHasherPort;
    use wardbook_core::{AppError, AppResult};

    use super::Argon2PasswordHasher;

    #[test]
    fn matching_password_verifies() -> AppResult<()> {
        let hasher = Argon2PasswordHasher::new();
        let hash = hasher.hash_password("ward-office-2026")?;

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("ward-office-2026", &hash)?);
        Ok(())
    }

    #[test]
    fn different_password_is_rejected() -> AppResult<()> {
        let hasher = Argon2PasswordHasher::new();
        let hash = hasher.hash_password("ward-office-2026")?;

        assert!(!hasher.verify_password("ward-office-2025", &hash)?);
        Ok(())
    }

    #[test]
    fn salts_differ_between_hashes() -> AppResult<()> {
        let hasher = Argon2PasswordHasher::new();

        assert_ne!(
            hasher.hash_password("same-password")?,
            hasher.hash_password("same-password")?
        );
        Ok(())
    }

    #[test]
    fn malformed_hash_is_an_internal_error() {
        let result = Argon2PasswordHasher::new().verify_password("secret", "plaintext");

        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
