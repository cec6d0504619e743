//! Read-only audit trail. Change records are only ever produced by item
//! mutations; there is no write surface here.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::get,
};

use stocktrail_core::{ChangeId, ItemId, UserId};
use stocktrail_store::{ChangeFilter, parse_change_ordering};

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_changes))
        .route("/:id", get(get_change))
}

pub async fn list_changes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ListChangesQuery>,
) -> axum::response::Response {
    let item = match query.item.as_deref().map(str::parse::<ItemId>) {
        Some(Ok(v)) => Some(v),
        Some(Err(e)) => return errors::domain_error_to_response(e),
        None => None,
    };
    let user = match query.user.as_deref().map(str::parse::<UserId>) {
        Some(Ok(v)) => Some(v),
        Some(Err(e)) => return errors::domain_error_to_response(e),
        None => None,
    };
    let change_type = match query.change_type.as_deref().map(errors::parse_change_type) {
        Some(Ok(v)) => Some(v),
        Some(Err(resp)) => return resp,
        None => None,
    };
    let descending = match query.ordering.as_deref().map(parse_change_ordering) {
        Some(Ok(v)) => v,
        Some(Err(e)) => return errors::domain_error_to_response(e),
        None => ChangeFilter::default().descending,
    };

    let filter = ChangeFilter {
        item,
        change_type,
        user,
        descending,
    };

    match services.store.list_changes(principal.scope(), filter).await {
        Ok(changes) => Json(changes).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_change(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ChangeId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.get_change(principal.scope(), id).await {
        Ok(change) => Json(change).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
