use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::{non_blank, parse_bool, parse_csv};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
    #[serde(default)]
    pub bootstrap: FileBootstrapConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Default, Clone, Deserialize, Serialize)]
pub struct FileAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_ttl_minutes: Option<i64>,
}

impl std::fmt::Debug for FileAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAuthConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("algorithm", &self.algorithm)
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .finish()
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Default, Clone, Deserialize, Serialize)]
pub struct FileBootstrapConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

impl std::fmt::Debug for FileBootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBootstrapConfig")
            .field("admin_email", &self.admin_email)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Environment-derived configuration values.
#[derive(Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub secret_key: Option<String>,
    pub algorithm: Option<String>,
    pub token_ttl_minutes: Option<i64>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub dev_mode: Option<bool>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl std::fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConfig")
            .field("config_path", &self.config_path)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("algorithm", &self.algorithm)
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("dev_mode", &self.dev_mode)
            .field("admin_email", &self.admin_email)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl EnvConfig {
    /// Read the process environment.
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset and
    /// unparseable numbers or booleans are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_blank(lookup(key));

        Self {
            config_path: var("WARDEN_CONFIG").map(PathBuf::from),
            server_host: var("SERVER_HOST"),
            server_port: var("SERVER_PORT").and_then(|s| s.trim().parse().ok()),
            database_url: var("DATABASE_URL"),
            secret_key: var("SECRET_KEY"),
            algorithm: var("ALGORITHM"),
            token_ttl_minutes: var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .and_then(|s| s.trim().parse().ok()),
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_csv(&raw)),
            dev_mode: var("DEV_MODE").and_then(|raw| parse_bool(&raw)),
            admin_email: var("ADMIN_EMAIL"),
            admin_password: var("ADMIN_PASSWORD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn reads_known_keys() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SECRET_KEY", "s3cr3t"),
            ("SERVER_PORT", "9000"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "45"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test,http://b.test"),
            ("DEV_MODE", "true"),
            ("SERVER_HOST", "   "),
        ]);
        let env = EnvConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(env.secret_key.as_deref(), Some("s3cr3t"));
        assert_eq!(env.server_port, Some(9000));
        assert_eq!(env.token_ttl_minutes, Some(45));
        assert_eq!(
            env.cors_allowed_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
        assert_eq!(env.dev_mode, Some(true));
        assert_eq!(env.server_host, None);
    }

    #[test]
    fn debug_hides_secrets() {
        let env = EnvConfig {
            secret_key: Some("top-secret-value".into()),
            admin_password: Some("admin-pass".into()),
            ..EnvConfig::default()
        };
        let rendered = format!("{env:?}");
        assert!(!rendered.contains("top-secret-value"));
        assert!(!rendered.contains("admin-pass"));
    }

    #[test]
    fn parses_toml_sections() {
        let file: FileConfig = toml::from_str(
            r#"
            dev_mode = true

            [server]
            port = 8080

            [auth]
            secret_key = "from-file"
            algorithm = "HS512"

            [bootstrap]
            admin_email = "root@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(file.server.port, Some(8080));
        assert_eq!(file.auth.algorithm.as_deref(), Some("HS512"));
        assert_eq!(file.bootstrap.admin_email.as_deref(), Some("root@example.com"));
        assert_eq!(file.dev_mode, Some(true));
        assert!(file.database.url.is_none());
    }
}
