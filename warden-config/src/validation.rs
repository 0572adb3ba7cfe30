use thiserror::Error;
use url::Url;
use warden_core::auth::token::{MAX_TOKEN_TTL_MINUTES, parse_algorithm};

use super::models::{Config, CorsConfig};

/// Shortest signing secret accepted without a warning.
pub const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("SECRET_KEY is not set; refusing to start without a token signing secret")]
    MissingSecret,
    #[error("invalid token signing algorithm '{name}': {reason}")]
    InvalidAlgorithm { name: String, reason: String },
    #[error(
        "token lifetime must be between 1 and {max} minutes, got {minutes}",
        max = MAX_TOKEN_TTL_MINUTES
    )]
    InvalidTokenTtl { minutes: i64 },
    #[error("DATABASE_URL is not set; set it or enable DEV_MODE for the in-memory store")]
    MissingDatabaseUrl,
    #[error("invalid database URL: {reason}")]
    InvalidDatabaseUrl { reason: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.auth.secret_key.trim().is_empty() {
        return Err(ConfigGuardRailError::MissingSecret);
    }
    if config.auth.secret_key.len() < MIN_SECRET_LENGTH {
        warnings.push_with_hint(
            format!("SECRET_KEY is shorter than {MIN_SECRET_LENGTH} bytes"),
            "Generate one with `openssl rand -hex 32`",
        );
    }

    parse_algorithm(&config.auth.algorithm).map_err(|err| {
        ConfigGuardRailError::InvalidAlgorithm {
            name: config.auth.algorithm.clone(),
            reason: err.to_string(),
        }
    })?;

    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&config.auth.token_ttl_minutes) {
        return Err(ConfigGuardRailError::InvalidTokenTtl {
            minutes: config.auth.token_ttl_minutes,
        });
    }

    match config.database.url.as_deref() {
        Some(url) => validate_database_url(url)?,
        None if config.dev_mode => warnings.push_with_hint(
            "DATABASE_URL not configured; using the in-memory user store",
            "Accounts are lost on restart; set DATABASE_URL to persist them",
        ),
        None => return Err(ConfigGuardRailError::MissingDatabaseUrl),
    }

    check_cors(&config.cors, &mut warnings);

    if config.bootstrap.is_none() && config.metadata.partial_bootstrap {
        warnings.push_with_hint(
            "Only one of ADMIN_EMAIL / ADMIN_PASSWORD is set; no admin account will be ensured",
            "Set both to create or promote an admin at startup",
        );
    }

    Ok(warnings)
}

fn validate_database_url(raw: &str) -> Result<(), ConfigGuardRailError> {
    let parsed = Url::parse(raw.trim()).map_err(|err| {
        ConfigGuardRailError::InvalidDatabaseUrl {
            reason: err.to_string(),
        }
    })?;

    match parsed.scheme() {
        "postgres" | "postgresql" => Ok(()),
        other => Err(ConfigGuardRailError::InvalidDatabaseUrl {
            reason: format!("unsupported scheme '{other}', expected postgres"),
        }),
    }
}

fn check_cors(cors: &CorsConfig, warnings: &mut ConfigWarnings) {
    if cors.is_wildcard_included() {
        warnings.push(
            "CORS allows any origin; restrict CORS_ALLOWED_ORIGINS outside development",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut config =
            Config::for_secret("0123456789abcdef0123456789abcdef");
        config.dev_mode = false;
        config.database.url = Some("postgres://warden@localhost/warden".into());
        config
    }

    #[test]
    fn production_config_passes_quietly() {
        let warnings = apply_guard_rails(&config()).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn missing_secret_is_fatal() {
        let mut config = config();
        config.auth.secret_key = String::new().into();
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::MissingSecret)
        ));
    }

    #[test]
    fn short_secret_warns() {
        let mut config = config();
        config.auth.secret_key = "short".to_string().into();
        let warnings = apply_guard_rails(&config).unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn asymmetric_algorithms_are_rejected() {
        let mut config = config();
        config.auth.algorithm = "RS256".into();
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::InvalidAlgorithm { .. })
        ));
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        let mut config = config();
        config.auth.token_ttl_minutes = 0;
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::InvalidTokenTtl { minutes: 0 })
        ));
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        let mut config = config();
        config.auth.token_ttl_minutes = 1_000_000_000_000;
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::InvalidTokenTtl {
                minutes: 1_000_000_000_000
            })
        ));

        config.auth.token_ttl_minutes = MAX_TOKEN_TTL_MINUTES;
        assert!(apply_guard_rails(&config).is_ok());
    }

    #[test]
    fn database_required_outside_dev_mode() {
        let mut config = config();
        config.database.url = None;
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::MissingDatabaseUrl)
        ));

        config.dev_mode = true;
        let warnings = apply_guard_rails(&config).unwrap();
        assert!(
            warnings
                .iter()
                .any(|w| w.message.contains("in-memory user store"))
        );
    }

    #[test]
    fn database_url_must_be_postgres() {
        let mut config = config();
        config.database.url = Some("mysql://localhost/warden".into());
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::InvalidDatabaseUrl { .. })
        ));

        config.database.url = Some("not a url".into());
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::InvalidDatabaseUrl { .. })
        ));
    }

    #[test]
    fn wildcard_cors_warns() {
        let mut config = config();
        config.cors.allowed_origins = vec!["*".into()];
        let warnings = apply_guard_rails(&config).unwrap();
        assert!(warnings.iter().any(|w| w.message.contains("any origin")));
    }
}
