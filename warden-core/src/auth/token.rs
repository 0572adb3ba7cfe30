use std::{fmt, str::FromStr};

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{AuthError, Result};

/// Lifetime of a login token when the caller does not pick one.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Longest token lifetime accepted from configuration: one year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 366 * 24 * 60;

/// Signing algorithm used when configuration does not name one.
pub const DEFAULT_ALGORITHM: &str = "HS256";

/// Claims carried by every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user identifier, as a string.
    pub sub: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Issue time, seconds since the Unix epoch.
    pub iat: i64,
}

/// Inputs for building a [`TokenService`].
///
/// The secret is zeroized on drop.
#[derive(Clone)]
pub struct TokenSettings {
    secret: Zeroizing<Vec<u8>>,
    algorithm: String,
    ttl: Duration,
}

impl TokenSettings {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: Zeroizing::new(secret.as_ref().to_vec()),
            algorithm: DEFAULT_ALGORITHM.to_string(),
            ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        }
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Parse a configured algorithm name, accepting only the shared-secret
/// HMAC family.
pub fn parse_algorithm(name: &str) -> Result<Algorithm> {
    let algorithm = Algorithm::from_str(name.trim()).map_err(|_| {
        AuthError::Configuration(format!(
            "unknown token signing algorithm '{name}'"
        ))
    })?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Ok(algorithm)
        }
        other => Err(AuthError::Configuration(format!(
            "token signing algorithm {other:?} needs a key pair; only HS256, HS384 and HS512 are supported"
        ))),
    }
}

/// Issues and verifies stateless bearer tokens.
///
/// Verification is a pure function of the token, the secret and the clock:
/// there is no server-side session store and no revocation list.
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(settings: &TokenSettings) -> Result<Self> {
        if settings.secret.is_empty() {
            return Err(AuthError::Configuration(
                "token signing secret is not set".to_string(),
            ));
        }
        let algorithm = parse_algorithm(&settings.algorithm)?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(&settings.secret),
            decoding_key: DecodingKey::from_secret(&settings.secret),
            validation,
            default_ttl: settings.ttl,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Sign a token for `subject` that expires after `ttl`, or after the
    /// configured default when `ttl` is `None`. A negative ttl produces a
    /// token that is already expired.
    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<String> {
        let now = Utc::now();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let exp = now.checked_add_signed(ttl).ok_or_else(|| {
            AuthError::Signing(format!(
                "token lifetime of {} seconds is out of range",
                ttl.num_seconds()
            ))
        })?;

        let claims = Claims {
            sub: subject.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))
    }

    /// Check signature, algorithm and expiry, returning the raw subject.
    pub fn verify(&self, token: &str) -> Result<String> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| {
                debug!(reason = %err, "bearer token rejected");
                AuthError::Unauthenticated
            })?;

        if data.claims.sub.is_empty() {
            debug!("bearer token carries an empty subject");
            return Err(AuthError::Unauthenticated);
        }

        Ok(data.claims.sub)
    }
}
