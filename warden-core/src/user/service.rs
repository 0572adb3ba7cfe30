use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::{
    AccessToken, NewUserRequest, User, UserUpdate,
    validation::{self, ValidationError},
};
use crate::{
    auth::{AuthService, Role},
    error::AuthError,
    store::{NewUser, StoreError, UserChanges, UserStore},
};

/// Largest page a listing may return.
pub const MAX_PAGE_SIZE: u32 = 1000;

pub const DUPLICATE_EMAIL: &str = "Email already registered";

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("User not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),

    /// The bootstrap email belongs to a non-admin account whose password
    /// does not match the configured one.
    #[error("account {email} exists and does not match the bootstrap credentials")]
    BootstrapMismatch { email: String },
}

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => UserError::Conflict(DUPLICATE_EMAIL.to_string()),
            StoreError::NotFound => UserError::NotFound,
            other => UserError::Store(other),
        }
    }
}

pub type UserResult<T> = Result<T, UserError>;

/// Account operations behind the HTTP handlers.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    auth: Arc<AuthService>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, auth: Arc<AuthService>) -> Self {
        Self { store, auth }
    }

    /// Create an account with the default role.
    pub async fn register(&self, request: NewUserRequest) -> UserResult<User> {
        let email = validation::normalize_email(&request.email)?;
        let firstname = validation::normalize_name("firstname", &request.firstname)?;
        let lastname = validation::normalize_name("lastname", &request.lastname)?;
        validation::check_password(&request.password)?;

        if self.store.find_by_login_name(&email).await?.is_some() {
            return Err(UserError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let password_hash = self.auth.hash_password(&request.password).await?;
        let user = self
            .store
            .create(NewUser {
                email,
                firstname,
                lastname,
                password_hash,
                role: Role::User,
            })
            .await?;

        info!(user_id = user.id, "registered new account");
        Ok(user)
    }

    /// Exchange a login name and password for a bearer token.
    pub async fn login(&self, login_name: &str, password: &str) -> UserResult<AccessToken> {
        let login_name = login_name.trim().to_lowercase();
        let user = self.auth.authenticate(&login_name, password).await?;
        let token = self.auth.issue_login_token(&user.id.to_string())?;

        info!(user_id = user.id, "issued login token");
        Ok(AccessToken::bearer(token))
    }

    pub async fn list(&self, skip: u32, limit: u32) -> UserResult<Vec<User>> {
        Ok(self.store.list(skip, limit.min(MAX_PAGE_SIZE)).await?)
    }

    pub async fn get(&self, id: i64) -> UserResult<User> {
        self.store.find_by_id(id).await?.ok_or(UserError::NotFound)
    }

    /// Profile self-service. A `role` in the payload is ignored.
    pub async fn update_self(&self, id: i64, update: UserUpdate) -> UserResult<User> {
        let changes = self.prepare_changes(update, false).await?;
        self.apply(id, changes).await
    }

    /// Admin update; the only path that can change a role.
    pub async fn admin_update(&self, id: i64, update: UserUpdate) -> UserResult<User> {
        let changes = self.prepare_changes(update, true).await?;
        let role_change = changes.role;
        let user = self.apply(id, changes).await?;
        if let Some(role) = role_change {
            info!(user_id = id, %role, "role assigned");
        }
        Ok(user)
    }

    pub async fn delete(&self, id: i64) -> UserResult<()> {
        if self.store.delete(id).await? {
            info!(user_id = id, "account deleted");
            Ok(())
        } else {
            Err(UserError::NotFound)
        }
    }

    /// Make sure an admin account exists for `email`: create it, or promote
    /// an existing account whose stored password matches `password`.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> UserResult<User> {
        let email = validation::normalize_email(email)?;
        validation::check_password(password)?;

        if let Some(existing) = self.store.find_by_login_name(&email).await? {
            if existing.user.role == Role::Admin {
                return Ok(existing.user);
            }
            if !self
                .auth
                .verify_password(password, &existing.password_hash)
                .await
            {
                warn!(
                    user_id = existing.user.id,
                    "bootstrap email is held by a non-admin account with a different password"
                );
                return Err(UserError::BootstrapMismatch { email });
            }
            warn!(user_id = existing.user.id, "promoting existing account to admin");
            let changes = UserChanges {
                role: Some(Role::Admin),
                ..UserChanges::default()
            };
            return self.apply(existing.user.id, changes).await;
        }

        let password_hash = self.auth.hash_password(password).await?;
        let user = self
            .store
            .create(NewUser {
                email,
                firstname: "Admin".to_string(),
                lastname: "Account".to_string(),
                password_hash,
                role: Role::Admin,
            })
            .await?;
        info!(user_id = user.id, "created bootstrap admin account");
        Ok(user)
    }

    async fn prepare_changes(
        &self,
        update: UserUpdate,
        allow_role: bool,
    ) -> UserResult<UserChanges> {
        let mut changes = UserChanges::default();

        if let Some(email) = update.email {
            changes.email = Some(validation::normalize_email(&email)?);
        }
        if let Some(firstname) = update.firstname {
            changes.firstname = Some(validation::normalize_name("firstname", &firstname)?);
        }
        if let Some(lastname) = update.lastname {
            changes.lastname = Some(validation::normalize_name("lastname", &lastname)?);
        }
        if let Some(password) = update.password {
            validation::check_password(&password)?;
            changes.password_hash = Some(self.auth.hash_password(&password).await?);
        }
        if allow_role {
            changes.role = update.role;
        }

        Ok(changes)
    }

    async fn apply(&self, id: i64, changes: UserChanges) -> UserResult<User> {
        self.store
            .update(id, changes)
            .await?
            .ok_or(UserError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{TokenSettings, crypto::fast_hasher},
        store::{MemoryUserStore, UserLookup},
    };

    fn service() -> (UserService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::default());
        let auth = AuthService::with_hasher(
            TokenSettings::new("user-service-test-secret"),
            fast_hasher(),
            store.clone(),
        )
        .unwrap();
        (UserService::new(store.clone(), Arc::new(auth)), store)
    }

    fn alice() -> NewUserRequest {
        NewUserRequest {
            email: "Alice@Example.com".into(),
            firstname: "Alice".into(),
            lastname: "Liddell".into(),
            password: "p1".into(),
        }
    }

    #[tokio::test]
    async fn register_defaults_to_user_role_and_normalizes_email() {
        let (users, _) = service();
        let user = users.register(alice()).await.unwrap();

        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let (users, _) = service();
        users.register(alice()).await.unwrap();

        let err = users.register(alice()).await.unwrap_err();
        assert!(matches!(err, UserError::Conflict(ref msg) if msg == DUPLICATE_EMAIL));
    }

    #[tokio::test]
    async fn register_rejects_bad_input() {
        let (users, _) = service();
        let mut request = alice();
        request.email = "not-an-email".into();
        assert!(matches!(
            users.register(request).await,
            Err(UserError::Validation(ValidationError::InvalidEmail(_)))
        ));

        let mut request = alice();
        request.password = String::new();
        assert!(matches!(
            users.register(request).await,
            Err(UserError::Validation(ValidationError::EmptyPassword))
        ));
    }

    #[tokio::test]
    async fn login_issues_bearer_token() {
        let (users, _) = service();
        users.register(alice()).await.unwrap();

        let token = users.login("ALICE@example.com ", "p1").await.unwrap();
        assert_eq!(token.token_type, "bearer");

        let err = users.login("alice@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, UserError::Auth(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn self_update_ignores_role() {
        let (users, _) = service();
        let user = users.register(alice()).await.unwrap();

        let updated = users
            .update_self(
                user.id,
                UserUpdate {
                    firstname: Some("Alicia".into()),
                    role: Some(Role::Admin),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.firstname, "Alicia");
        assert_eq!(updated.role, Role::User);
    }

    #[tokio::test]
    async fn admin_update_assigns_role() {
        let (users, _) = service();
        let user = users.register(alice()).await.unwrap();

        let updated = users
            .admin_update(
                user.id,
                UserUpdate {
                    role: Some(Role::Admin),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Admin);

        assert!(matches!(
            users.admin_update(999, UserUpdate::default()).await,
            Err(UserError::NotFound)
        ));
    }

    #[tokio::test]
    async fn password_change_takes_effect_at_next_login() {
        let (users, _) = service();
        let user = users.register(alice()).await.unwrap();

        users
            .update_self(
                user.id,
                UserUpdate {
                    password: Some("p2".into()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();

        assert!(users.login("alice@example.com", "p1").await.is_err());
        assert!(users.login("alice@example.com", "p2").await.is_ok());
    }

    #[tokio::test]
    async fn list_caps_page_size() {
        let (users, _) = service();
        users.register(alice()).await.unwrap();

        assert_eq!(users.list(0, u32::MAX).await.unwrap().len(), 1);
        assert!(users.list(1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_and_get() {
        let (users, _) = service();
        let user = users.register(alice()).await.unwrap();

        assert_eq!(users.get(user.id).await.unwrap(), user);
        users.delete(user.id).await.unwrap();
        assert!(matches!(users.get(user.id).await, Err(UserError::NotFound)));
        assert!(matches!(users.delete(user.id).await, Err(UserError::NotFound)));
    }

    #[tokio::test]
    async fn ensure_admin_creates_then_returns_existing() {
        let (users, _) = service();
        let admin = users.ensure_admin("root@example.com", "rootpw").await.unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.firstname, "Admin");

        let again = users.ensure_admin("root@example.com", "rootpw").await.unwrap();
        assert_eq!(again.id, admin.id);
    }

    #[tokio::test]
    async fn ensure_admin_promotes_account_with_matching_password() {
        let (users, store) = service();
        let alice = users.register(alice()).await.unwrap();

        let promoted = users.ensure_admin("alice@example.com", "p1").await.unwrap();
        assert_eq!(promoted.id, alice.id);
        assert_eq!(
            store.find_by_id(alice.id).await.unwrap().unwrap().role,
            Role::Admin
        );
    }

    #[tokio::test]
    async fn ensure_admin_refuses_account_with_other_password() {
        let (users, store) = service();
        let alice = users.register(alice()).await.unwrap();

        let err = users
            .ensure_admin("alice@example.com", "operator-secret")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::BootstrapMismatch { .. }));
        assert_eq!(
            store.find_by_id(alice.id).await.unwrap().unwrap().role,
            Role::User
        );
    }
}
