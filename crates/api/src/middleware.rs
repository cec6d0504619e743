use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use stocktrail_auth::JwtValidator;

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Rejects requests without a valid bearer token. Rejections carry the
/// standard JSON error body.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())?;

    let claims = state
        .jwt
        .validate(token, Utc::now())
        .map_err(|_e| invalid_token())?;

    req.extensions_mut()
        .insert(PrincipalContext::new(claims.sub, claims.roles));

    Ok(next.run(req).await)
}

/// Attaches a principal when a valid token is present, passes the request
/// through anonymously otherwise. A present-but-invalid token still fails.
/// Handlers behind this middleware decide which operations need a principal.
pub async fn auth_middleware_optional(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    if req.headers().contains_key(axum::http::header::AUTHORIZATION) {
        let token = extract_bearer(req.headers())?;
        let claims = state
            .jwt
            .validate(token, Utc::now())
            .map_err(|_e| invalid_token())?;
        req.extensions_mut()
            .insert(PrincipalContext::new(claims.sub, claims.roles));
    }

    Ok(next.run(req).await)
}

fn invalid_token() -> Response {
    errors::json_error(
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "invalid or expired token",
    )
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Response> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(errors::login_required)?;

    let header = header.to_str().map_err(|_| errors::login_required())?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or_else(errors::login_required)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(errors::login_required());
    }

    Ok(token)
}
