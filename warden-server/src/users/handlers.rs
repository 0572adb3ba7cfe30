use axum::{Form, Json, extract::State};
use serde_json::{Value, json};
use tracing::info;
use warden_core::user::{AccessToken, LoginForm, NewUserRequest, User};

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Warden API" }))
}

/// `POST /users/register`
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<NewUserRequest>,
) -> AppResult<Json<User>> {
    let user = state.users.register(request).await?;
    Ok(Json(user))
}

/// `POST /users/login`, form encoded. Unknown emails and wrong passwords
/// both answer 401.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Json<AccessToken>> {
    let token = state.users.login(&form.username, &form.password).await?;
    info!("login succeeded");
    Ok(Json(token))
}
