//! Authentication and authorization core.
//!
//! Request flow:
//!
//! 1. [`resolver::CallerResolver`] verifies the bearer token with
//!    [`token::TokenService`] and loads the caller from the user store.
//! 2. An optional [`gate::RoleGate`] narrows access to a single role.
//! 3. The request-specific logic runs with the resolved [`Identity`].
//!
//! [`AuthService`] bundles these pieces behind the surface the HTTP layer
//! consumes.

pub mod crypto;
pub mod gate;
pub mod identity;
pub mod resolver;
pub mod service;
pub mod token;

pub use crypto::CredentialHasher;
pub use gate::{RoleGate, require};
pub use identity::{Identity, Role};
pub use resolver::CallerResolver;
pub use service::AuthService;
pub use token::{Claims, TokenService, TokenSettings};
