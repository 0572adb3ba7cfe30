//! Persistence port for user accounts.
//!
//! The auth core only needs [`UserLookup`]; the account service needs the
//! full [`UserStore`]. A PostgreSQL adapter lives in the server crate and
//! [`MemoryUserStore`] backs tests and dev mode.

mod memory;

pub use memory::MemoryUserStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::{auth::Role, user::User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("record not found")]
    NotFound,

    /// The backing store failed; the message is for logs only.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// An account together with its stored password hash.
///
/// Only returned by login-name lookups; nothing serializes it.
#[derive(Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("user", &self.user)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Fields of an account about to be inserted. The id and timestamps are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Read-only lookups consumed by caller resolution and login.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// Login names are email addresses, compared after lowercasing.
    async fn find_by_login_name(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError>;
}

/// Full account persistence.
#[async_trait]
pub trait UserStore: UserLookup {
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Accounts ordered by id.
    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<User>, StoreError>;

    /// Apply `changes` and bump `updated_at`. Returns `None` when the id is
    /// unknown.
    async fn update(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}
