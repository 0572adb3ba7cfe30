use std::{fmt, path::PathBuf};

use chrono::Duration;
use warden_core::{AuthError, auth::TokenSettings};
use zeroize::Zeroizing;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Fully composed configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub bootstrap: Option<BootstrapAdmin>,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

impl Config {
    /// Minimal dev-mode configuration around a secret.
    pub fn for_secret(secret: impl Into<String>) -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::new(secret),
            cors: CorsConfig::default(),
            bootstrap: None,
            dev_mode: true,
            metadata: ConfigMetadata::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Connection strings may embed a password.
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<set>"))
            .finish()
    }
}

/// Token signing settings. The secret is zeroized on drop.
#[derive(Clone)]
pub struct AuthConfig {
    pub secret_key: Zeroizing<String>,
    pub algorithm: String,
    pub token_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret_key: Zeroizing::new(secret.into()),
            algorithm: warden_core::auth::token::DEFAULT_ALGORITHM.to_string(),
            token_ttl_minutes: warden_core::auth::token::DEFAULT_TOKEN_TTL_MINUTES,
        }
    }

    /// Fails with [`AuthError::Configuration`] when the ttl does not fit a
    /// [`Duration`].
    pub fn token_settings(&self) -> Result<TokenSettings, AuthError> {
        let ttl = Duration::try_minutes(self.token_ttl_minutes).ok_or_else(|| {
            AuthError::Configuration(format!(
                "token lifetime of {} minutes is out of range",
                self.token_ttl_minutes
            ))
        })?;
        Ok(TokenSettings::new(self.secret_key.as_bytes())
            .with_algorithm(self.algorithm.clone())
            .with_ttl(ttl))
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Empty means no cross-origin access; `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn is_wildcard_included(&self) -> bool {
        self.allowed_origins
            .iter()
            .any(|origin| origin.trim() == "*")
    }
}

/// Admin account ensured at startup.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: Zeroizing<String>,
}

impl BootstrapAdmin {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Zeroizing::new(password.into()),
        }
    }
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
    /// Exactly one of the two bootstrap admin keys was provided.
    pub partial_bootstrap: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_stay_out_of_debug_output() {
        let mut config = Config::for_secret("a-very-secret-signing-key");
        config.database.url = Some("postgres://app:dbpass@db/warden".into());
        config.bootstrap =
            Some(BootstrapAdmin::new("root@example.com", "bootstrap-pass"));

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("a-very-secret-signing-key"));
        assert!(!rendered.contains("dbpass"));
        assert!(!rendered.contains("bootstrap-pass"));
        assert!(rendered.contains("root@example.com"));
    }

    #[test]
    fn token_settings_carry_algorithm_and_ttl() {
        let mut auth = AuthConfig::new("secret");
        auth.algorithm = "HS384".into();
        auth.token_ttl_minutes = 5;

        let settings = auth.token_settings().unwrap();
        assert_eq!(settings.algorithm(), "HS384");
        assert_eq!(settings.ttl(), Duration::minutes(5));
    }

    #[test]
    fn unrepresentable_ttl_is_a_configuration_error() {
        let mut auth = AuthConfig::new("secret");
        auth.token_ttl_minutes = i64::MAX;

        assert!(matches!(
            auth.token_settings(),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn default_bind_address() {
        assert_eq!(ServerConfig::default().bind_address(), "0.0.0.0:8000");
    }
}
