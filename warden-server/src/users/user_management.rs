use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;
use warden_core::{
    Identity,
    user::{User, UserUpdate},
};

use crate::infra::{app_state::AppState, errors::AppResult};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

/// Admins get a page of accounts; everyone else gets their own profile.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UsersResponse {
    List(Vec<User>),
    Single(User),
}

/// `GET /users`
pub async fn list_users(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<UsersResponse>> {
    if caller.is_admin() {
        let users = state
            .users
            .list(
                query.skip.unwrap_or(0),
                query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            )
            .await?;
        Ok(Json(UsersResponse::List(users)))
    } else {
        let me = state.users.get(caller.id).await?;
        Ok(Json(UsersResponse::Single(me)))
    }
}

/// `PUT /users/me`
pub async fn update_me(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Json(update): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    let user = state.users.update_self(caller.id, update).await?;
    info!(user_id = caller.id, "profile updated");
    Ok(Json(user))
}

/// `GET /users/{id}`, admin only.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.get(id).await?))
}

/// `PUT /users/{id}`, admin only. The only route that can change a role.
pub async fn admin_update_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Path(id): Path<i64>,
    Json(update): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    let user = state.users.admin_update(id, update).await?;
    info!(admin_id = caller.id, user_id = id, "account updated by admin");
    Ok(Json(user))
}

/// `DELETE /users/{id}`, admin only.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.users.delete(id).await?;
    info!(admin_id = caller.id, user_id = id, "account deleted by admin");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
