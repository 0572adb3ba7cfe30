use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString,
    },
};
use rand::{TryRngCore, rngs::OsRng};

use crate::error::{AuthError, Result};

/// One-way password hashing with Argon2id.
///
/// Every call to [`CredentialHasher::hash`] draws a fresh salt, so hashing
/// the same secret twice yields two different PHC strings that both verify.
/// Verification reads the algorithm parameters from the stored hash, which
/// keeps old hashes valid when the defaults are retuned.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// Recommended defaults target ~64 MiB memory and 3 iterations which is a
    /// solid baseline for servers without dedicated tuning.
    const DEFAULT_MEMORY_KIB: u32 = 64 * 1024; // 64 MiB
    const DEFAULT_ITERATIONS: u32 = 3;
    const DEFAULT_PARALLELISM: u32 = 1;
    const SALT_LENGTH: usize = Salt::RECOMMENDED_LENGTH;

    /// Longest secret accepted for hashing, in bytes.
    pub const MAX_SECRET_LEN: usize = 4096;

    /// Build a hasher with default Argon2id parameters.
    pub fn new() -> Result<Self> {
        let params = ParamsBuilder::new()
            .m_cost(Self::DEFAULT_MEMORY_KIB)
            .t_cost(Self::DEFAULT_ITERATIONS)
            .p_cost(Self::DEFAULT_PARALLELISM)
            .output_len(32)
            .build()
            .map_err(|err| {
                AuthError::Configuration(format!(
                    "invalid Argon2 parameters: {err}"
                ))
            })?;
        Ok(Self::with_params(params))
    }

    /// Build a hasher with caller-specified Argon2 parameters (useful for
    /// integration tests or constrained environments).
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::default(), params),
        }
    }

    /// Hash a secret into a PHC string suitable for storage.
    pub fn hash(&self, secret: &str) -> Result<String> {
        if secret.is_empty() {
            return Err(AuthError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }
        if secret.len() > Self::MAX_SECRET_LEN {
            return Err(AuthError::InvalidInput(format!(
                "password cannot exceed {} bytes",
                Self::MAX_SECRET_LEN
            )));
        }

        let mut salt_bytes = [0u8; Self::SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| AuthError::Hashing(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|err| AuthError::Hashing(err.to_string()))?;

        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|err| AuthError::Hashing(err.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// Check a secret against a stored hash.
    ///
    /// A malformed hash is a plain mismatch, never an error. The digest
    /// comparison inside argon2 is constant time.
    pub fn verify(&self, secret: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.argon2
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> CredentialHasher {
    CredentialHasher::with_params(
        Params::new(Params::MIN_M_COST, 1, 1, None)
            .expect("minimal argon2 params are valid"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_passwords_and_verifies() {
        let hasher = fast_hasher();
        let hash = hasher.hash("correct horse").unwrap();
        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("battery staple", &hash));
    }

    #[test]
    fn same_secret_hashes_differently_each_time() {
        let hasher = fast_hasher();
        let first = hasher.hash("p1").unwrap();
        let second = hasher.hash("p1").unwrap();
        assert_ne!(first, second);
        assert!(hasher.verify("p1", &first));
        assert!(hasher.verify("p1", &second));
    }

    #[test]
    fn hashes_are_argon2id_phc_strings() {
        let hash = fast_hasher().hash("secret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("secret"));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("secret", ""));
        assert!(!hasher.verify("secret", "not-a-phc-string"));
        assert!(!hasher.verify("secret", "$argon2id$v=19$broken"));
    }

    #[test]
    fn verifies_with_parameters_encoded_in_the_hash() {
        let hash = fast_hasher().hash("secret").unwrap();
        let default = CredentialHasher::new().unwrap();
        assert!(default.verify("secret", &hash));
    }

    #[test]
    fn rejects_empty_and_oversized_secrets() {
        let hasher = fast_hasher();
        assert!(matches!(
            hasher.hash(""),
            Err(AuthError::InvalidInput(_))
        ));
        let oversized = "x".repeat(CredentialHasher::MAX_SECRET_LEN + 1);
        assert!(matches!(
            hasher.hash(&oversized),
            Err(AuthError::InvalidInput(_))
        ));
    }
}
