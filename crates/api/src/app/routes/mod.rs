use axum::Router;

pub mod categories;
pub mod changes;
pub mod items;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/users", users::router())
        .nest("/items", items::router())
        .nest("/changes", changes::router())
}
