//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage backend wiring (in-memory or Postgres)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and query-parameter shapes
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(jwt_secret: String) -> Router {
    let jwt = Arc::new(stocktrail_auth::Hs256JwtValidator::new(
        jwt_secret.into_bytes(),
    ));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::build_services().await);

    // Protected routes: require an authenticated principal.
    let protected = routes::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state.clone(),
            middleware::auth_middleware,
        ));

    // Categories are readable anonymously; writes check the principal in the
    // handler.
    let categories = routes::categories::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware_optional,
        ));

    Router::new()
        .route("/", get(routes::system::discovery))
        .route("/health", get(routes::system::health))
        .nest("/categories", categories)
        .merge(protected)
        .layer(ServiceBuilder::new())
}
