//! Request DTOs and query-parameter shapes.
//!
//! Creation bodies deserialize straight into the domain input types
//! (`NewItem`, `NewCategory`, `NewUser`). Item updates need their own DTO:
//! `category` must distinguish "absent" (keep) from `null` (clear), which
//! plain `Option<Option<T>>` deserialization collapses.

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use stocktrail_core::CategoryId;
use stocktrail_inventory::ItemPatch;

use crate::app::errors;

/// `axum::Json` with the rejection rendered in the standard error body
/// instead of axum's plain-text default.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(errors::json_error(
                rejection.status(),
                "invalid_body",
                rejection.body_text(),
            )),
        }
    }
}

/// Wraps the deserialized value in `Some`, so a field that is present but
/// `null` lands as `Some(None)` while an absent field stays `None`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_some")]
    pub category: Option<Option<CategoryId>>,
}

impl From<UpdateItemRequest> for ItemPatch {
    fn from(req: UpdateItemRequest) -> Self {
        ItemPatch {
            name: req.name,
            description: req.description,
            quantity: req.quantity,
            price: req.price,
            category: req.category,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListItemsQuery {
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LowStockQuery {
    pub threshold: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchItemsQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListChangesQuery {
    pub item: Option<String>,
    pub change_type: Option<String>,
    pub user: Option<String>,
    pub ordering: Option<String>,
}
