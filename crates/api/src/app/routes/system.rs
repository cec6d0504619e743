use axum::{Json, http::StatusCode, response::IntoResponse};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// API root: lists the top-level collections.
pub async fn discovery() -> impl IntoResponse {
    Json(serde_json::json!({
        "users": "/users",
        "categories": "/categories",
        "items": "/items",
        "changes": "/changes",
    }))
}
