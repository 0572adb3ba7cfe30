//! Configuration loading for Warden.
//!
//! Values are layered: `.env` file first, then an optional TOML file, then
//! process environment variables, which win over the file. After composition
//! the guard rails in [`validation`] reject configurations the server must
//! not start with and collect warnings for the ones it merely should not.

pub mod loader;
pub mod models;
pub mod sources;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader};
pub use models::{
    AuthConfig, BootstrapAdmin, Config, ConfigMetadata, CorsConfig,
    DatabaseConfig, ServerConfig,
};
pub use sources::{EnvConfig, FileConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
