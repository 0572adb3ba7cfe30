use std::sync::Arc;

use tracing::{debug, warn};

use super::{Identity, token::TokenService};
use crate::{
    error::{AuthError, Result},
    store::UserLookup,
};

/// Turns a bearer token into the [`Identity`] of a stored account.
///
/// Every failure (bad signature, expired token, non-numeric subject,
/// deleted account, store outage) collapses into
/// [`AuthError::Unauthenticated`]. The cause is only visible in logs.
#[derive(Clone)]
pub struct CallerResolver {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserLookup>,
}

impl std::fmt::Debug for CallerResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallerResolver")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl CallerResolver {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserLookup>) -> Self {
        Self { tokens, users }
    }

    pub async fn resolve(&self, token: &str) -> Result<Identity> {
        let subject = self.tokens.verify(token)?;

        let id: i64 = subject.parse().map_err(|_| {
            debug!(%subject, "token subject is not a user id");
            AuthError::Unauthenticated
        })?;

        match self.users.find_by_id(id).await {
            Ok(Some(user)) => Ok(Identity::from(&user)),
            Ok(None) => {
                debug!(user_id = id, "token subject no longer exists");
                Err(AuthError::Unauthenticated)
            }
            Err(err) => {
                warn!(user_id = id, error = %err, "user lookup failed while resolving caller");
                Err(AuthError::Unauthenticated)
            }
        }
    }
}
