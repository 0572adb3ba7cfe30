use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    CallerResolver, CredentialHasher, Identity, Role, RoleGate,
    token::{TokenService, TokenSettings},
};
use crate::{
    error::{AuthError, Result},
    store::UserLookup,
    user::User,
};

/// The surface the routing layer consumes: password hashing, login token
/// issuance, caller resolution and role gates.
///
/// Built once at startup. Construction fails with
/// [`AuthError::Configuration`] when the signing secret is missing or the
/// algorithm is unusable, so a misconfigured process never starts serving.
#[derive(Clone)]
pub struct AuthService {
    hasher: Arc<CredentialHasher>,
    tokens: Arc<TokenService>,
    resolver: CallerResolver,
    users: Arc<dyn UserLookup>,
    dummy_hash: Arc<str>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(settings: TokenSettings, users: Arc<dyn UserLookup>) -> Result<Self> {
        Self::with_hasher(settings, CredentialHasher::new()?, users)
    }

    /// Same as [`AuthService::new`] with explicit hashing parameters.
    pub fn with_hasher(
        settings: TokenSettings,
        hasher: CredentialHasher,
        users: Arc<dyn UserLookup>,
    ) -> Result<Self> {
        let tokens = Arc::new(TokenService::new(&settings)?);
        // Unknown login names are checked against this so a miss costs the
        // same as a wrong password.
        let dummy_hash: Arc<str> = hasher.hash("warden-dummy-credential")?.into();
        let resolver = CallerResolver::new(tokens.clone(), users.clone());

        info!(
            algorithm = ?tokens.algorithm(),
            ttl_minutes = tokens.default_ttl().num_minutes(),
            "token service ready"
        );

        Ok(Self {
            hasher: Arc::new(hasher),
            tokens,
            resolver,
            users,
            dummy_hash,
        })
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Hash a password on a blocking worker thread.
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))?
    }

    /// Verify a password on a blocking worker thread. A worker failure is a
    /// mismatch.
    pub async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .unwrap_or(false)
    }

    /// Sign a token for `subject` with the configured lifetime.
    pub fn issue_login_token(&self, subject: &str) -> Result<String> {
        self.tokens.issue(subject, None)
    }

    pub async fn resolve_caller(&self, token: &str) -> Result<Identity> {
        self.resolver.resolve(token).await
    }

    pub fn require_role(&self, role: Role) -> RoleGate {
        RoleGate::new(role)
    }

    /// Check a login name and password against the store.
    ///
    /// Unknown login names, wrong passwords and store failures all yield
    /// [`AuthError::Unauthenticated`].
    pub async fn authenticate(&self, login_name: &str, password: &str) -> Result<User> {
        let credentials = match self.users.find_by_login_name(login_name).await {
            Ok(credentials) => credentials,
            Err(err) => {
                warn!(error = %err, "user lookup failed during login");
                None
            }
        };

        match credentials {
            Some(credentials) => {
                if self
                    .verify_password(password, &credentials.password_hash)
                    .await
                {
                    Ok(credentials.user)
                } else {
                    debug!(user_id = credentials.user.id, "login rejected: wrong password");
                    Err(AuthError::Unauthenticated)
                }
            }
            None => {
                let _ = self.verify_password(password, &self.dummy_hash).await;
                debug!("login rejected: unknown login name");
                Err(AuthError::Unauthenticated)
            }
        }
    }
}
