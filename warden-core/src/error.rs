use thiserror::Error;

use crate::auth::Role;

/// Failure kinds surfaced by the authentication core.
///
/// `Unauthenticated` deliberately carries no detail: every token or
/// identity failure renders the same message so callers cannot tell which
/// check rejected them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Startup-only: the signing secret is missing or the algorithm is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed input handed to the credential hasher.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing, invalid or expired token, unknown subject, or bad login.
    #[error("Could not validate credentials")]
    Unauthenticated,

    /// The caller is authenticated but lacks the required role.
    #[error("Access denied: {required} role required")]
    Forbidden { required: Role },

    /// The hashing backend itself failed (salt generation, worker panic).
    #[error("credential hashing failed: {0}")]
    Hashing(String),

    /// A token could not be produced for a valid request.
    #[error("token signing failed: {0}")]
    Signing(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
