use std::{fmt, sync::Arc};

use warden_core::{
    AuthError, AuthService, UserService, UserStore, auth::CredentialHasher,
};

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the shared services over `store`. Fails with
    /// [`AuthError::Configuration`] when the token settings are unusable.
    pub fn new<S>(config: Config, store: Arc<S>) -> Result<Self, AuthError>
    where
        S: UserStore + 'static,
    {
        Self::with_hasher(config, store, CredentialHasher::new()?)
    }

    pub fn with_hasher<S>(
        config: Config,
        store: Arc<S>,
        hasher: CredentialHasher,
    ) -> Result<Self, AuthError>
    where
        S: UserStore + 'static,
    {
        let auth = Arc::new(AuthService::with_hasher(
            config.auth.token_settings()?,
            hasher,
            store.clone(),
        )?);
        let users = Arc::new(UserService::new(store, auth.clone()));

        Ok(Self {
            auth,
            users,
            config: Arc::new(config),
        })
    }
}
