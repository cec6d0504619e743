//! Item CRUD plus the low-stock and search views.
//!
//! Staff principals see the whole inventory; everyone else only the items
//! they created, and a foreign item id reads as not-found.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use stocktrail_core::{CategoryId, ItemId};
use stocktrail_inventory::NewItem;
use stocktrail_store::{ItemFilter, ItemOrdering, ItemSearch};

use crate::app::dto::{self, ApiJson, UpdateItemRequest};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Items running at or below this quantity count as low stock.
const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

pub fn router() -> Router {
    Router::new()
        .route("/low_stock", get(low_stock))
        .route("/search", get(search_items))
        .route("/", get(list_items).post(create_item))
        .route(
            "/:id",
            get(get_item)
                .put(update_item)
                .patch(update_item)
                .delete(delete_item),
        )
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<NewItem>,
) -> axum::response::Response {
    match services.store.create_item(principal.user_id(), body).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ListItemsQuery>,
) -> axum::response::Response {
    let category = match query.category.as_deref().map(str::parse::<CategoryId>) {
        Some(Ok(v)) => Some(v),
        Some(Err(e)) => return errors::domain_error_to_response(e),
        None => None,
    };
    let ordering = match query.ordering.as_deref().map(ItemOrdering::parse) {
        Some(Ok(v)) => v,
        Some(Err(e)) => return errors::domain_error_to_response(e),
        None => ItemOrdering::default(),
    };

    let filter = ItemFilter {
        category,
        quantity: query.quantity,
        search: query.search,
        ordering,
    };

    match services.store.list_items(principal.scope(), filter).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::LowStockQuery>,
) -> axum::response::Response {
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);

    match services.store.low_stock(principal.scope(), threshold).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn search_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::SearchItemsQuery>,
) -> axum::response::Response {
    let search = ItemSearch {
        q: query.q,
        category: query.category,
        min_price: query.min_price,
        max_price: query.max_price,
    };

    match services.store.search_items(principal.scope(), search).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.get_item(principal.scope(), id).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateItemRequest>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .store
        .update_item(principal.user_id(), principal.scope(), id, body.into())
        .await
    {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .store
        .delete_item(principal.user_id(), principal.scope(), id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
