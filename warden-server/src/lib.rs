//! # Warden Server
//!
//! HTTP surface for the Warden account service: registration, password
//! login issuing bearer tokens, profile self-service and admin-gated user
//! management.
//!
//! Authentication and authorization live in `warden-core`; this crate wires
//! them into axum as middleware (`auth_middleware` resolves the caller,
//! `require_role` gates it) and provides the PostgreSQL user store.

pub mod db;
pub mod infra;
pub mod routes;
pub mod users;

pub use infra::app_state::AppState;
