pub use warden_config::{
    AuthConfig, BootstrapAdmin, Config, ConfigLoad, ConfigLoadError,
    ConfigLoader, ConfigWarnings, CorsConfig, DatabaseConfig, EnvConfig,
    ServerConfig, loader, models, sources, validation,
};
