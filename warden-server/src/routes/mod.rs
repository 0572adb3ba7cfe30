use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use warden_core::Role;

use crate::{
    infra::{app_state::AppState, config::CorsConfig},
    users::{
        auth::{auth_middleware, require_role},
        handlers, user_management,
    },
};

/// Build the application router with state applied.
///
/// | route                 | guard         |
/// |-----------------------|---------------|
/// | `GET /`               | none          |
/// | `POST /users/register`| none          |
/// | `POST /users/login`   | none          |
/// | `GET /users`          | authenticated |
/// | `PUT /users/me`       | authenticated |
/// | `GET/PUT/DELETE /users/{id}` | admin  |
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(handlers::root))
        .route("/users/register", post(handlers::register))
        .route("/users/login", post(handlers::login));

    let authenticated = Router::new()
        .route("/users", get(user_management::list_users))
        .route("/users/me", put(user_management::update_me))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let admin = Router::new()
        .route(
            "/users/{id}",
            get(user_management::get_user)
                .put(user_management::admin_update_user)
                .delete(user_management::delete_user),
        )
        .route_layer(from_fn(require_role(Role::Admin)))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state.config.cors);

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins = if cors.is_wildcard_included() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
