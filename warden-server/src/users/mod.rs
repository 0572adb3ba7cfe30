pub mod auth;
pub mod handlers;
pub mod user_management;

pub use warden_core::UserService;
