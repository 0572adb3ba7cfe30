//! Core library for Warden.
//!
//! Warden is a small user-account service. This crate owns the parts with
//! real invariants:
//!
//! - **Credential hashing**: Argon2id with a fresh salt per hash and
//!   constant-time verification ([`auth::crypto`]).
//! - **Bearer tokens**: stateless HMAC-signed JWTs carrying `sub`/`exp`
//!   ([`auth::token`]).
//! - **Caller resolution**: token to [`Identity`], collapsing every failure
//!   into one generic [`AuthError::Unauthenticated`] ([`auth::resolver`]).
//! - **Role gates**: composable guards rejecting callers without a required
//!   [`Role`] ([`auth::gate`]).
//!
//! On top of those sits the user management service ([`user::UserService`])
//! and the storage port it runs against ([`store`]).
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use warden_core::{
//!     auth::{AuthService, TokenSettings},
//!     store::MemoryUserStore,
//! };
//!
//! # async fn example() -> Result<(), warden_core::AuthError> {
//! let store = Arc::new(MemoryUserStore::default());
//! let auth = AuthService::new(TokenSettings::new("a-long-random-secret"), store)?;
//!
//! let hash = auth.hash_password("correct horse").await?;
//! assert!(auth.verify_password("correct horse", &hash).await);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod store;
pub mod user;

pub use auth::{AuthService, Identity, Role, RoleGate};
pub use error::{AuthError, Result};
pub use store::{StoreError, UserLookup, UserStore};
pub use user::{User, UserService};
