use std::{future::Future, pin::Pin};

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;
use warden_core::{AuthError, Identity, Role, auth::require};

use crate::infra::{app_state::AppState, errors::AppError};

/// Resolve the bearer token into an [`Identity`] and store it in the
/// request extensions. Any failure is a 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = extract_bearer_token(&request) else {
        debug!(path = %request.uri().path(), "request without bearer token");
        return Err(AuthError::Unauthenticated.into());
    };

    let identity = state.auth.resolve_caller(&token).await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Middleware admitting only callers holding `role`.
/// Must run AFTER `auth_middleware` in the layer stack.
pub fn require_role(
    role: Role,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>>
+ Clone
+ Send
+ Sync
+ 'static {
    move |request: Request, next: Next| Box::pin(check_role(request, next, role))
}

async fn check_role(request: Request, next: Next, role: Role) -> Response {
    let Some(identity) = request.extensions().get::<Identity>().cloned() else {
        return AppError::from(AuthError::Unauthenticated).into_response();
    };

    match require(role).check(identity) {
        Ok(_) => next.run(request).await,
        Err(err) => {
            debug!(required = %role, "caller rejected by role gate");
            AppError::from(err).into_response()
        }
    }
}

/// The token from an `Authorization: Bearer <token>` header. The scheme is
/// matched case-insensitively.
pub fn extract_bearer_token(request: &Request) -> Option<String> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;

    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
