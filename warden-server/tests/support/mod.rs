#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use argon2::Params;
use axum_test::TestServer;
use serde_json::{Value, json};
use warden_core::{
    Role, UserStore,
    auth::CredentialHasher,
    store::{MemoryUserStore, UserChanges},
    user::LoginForm,
};
use warden_server::{
    AppState,
    infra::config::Config,
    routes::create_router,
};

pub const TEST_SECRET: &str = "warden-server-test-secret-0123456789";
pub const PASSWORD: &str = "Password#123";

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub store: Arc<MemoryUserStore>,
}

pub fn fast_hasher() -> CredentialHasher {
    let params = Params::new(Params::MIN_M_COST, 1, 1, None)
        .expect("argon2 params are valid");
    CredentialHasher::with_params(params)
}

pub fn test_config() -> Config {
    Config::for_secret(TEST_SECRET)
}

pub fn build_test_app() -> Result<TestApp> {
    build_test_app_with_config(test_config())
}

pub fn build_test_app_with_config(config: Config) -> Result<TestApp> {
    let store = Arc::new(MemoryUserStore::new());
    let state = AppState::with_hasher(config, store.clone(), fast_hasher())
        .context("failed to build app state")?;
    let server = TestServer::new(create_router(state.clone()))
        .map_err(|err| anyhow!(err.to_string()))?;

    Ok(TestApp {
        server,
        state,
        store,
    })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Register an account and return its id.
pub async fn register(server: &TestServer, email: &str) -> i64 {
    let response = server
        .post("/users/register")
        .json(&json!({
            "email": email,
            "firstname": "Test",
            "lastname": "User",
            "password": PASSWORD,
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["id"].as_i64().expect("id present")
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/users/login")
        .form(&LoginForm {
            username: email.to_string(),
            password: password.to_string(),
        })
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["access_token"]
        .as_str()
        .expect("access_token present")
        .to_string()
}

pub async fn promote_to_admin(store: &MemoryUserStore, id: i64) {
    let changes = UserChanges {
        role: Some(Role::Admin),
        ..UserChanges::default()
    };
    store
        .update(id, changes)
        .await
        .expect("store update succeeds")
        .expect("user exists");
}

/// Register, promote and log in an admin; returns `(id, token)`.
pub async fn admin_session(app: &TestApp, email: &str) -> (i64, String) {
    let id = register(&app.server, email).await;
    promote_to_admin(&app.store, id).await;
    let token = login(&app.server, email, PASSWORD).await;
    (id, token)
}
