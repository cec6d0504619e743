use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stocktrail_core::{CategoryId, DomainResult, ItemId, UserId, ValidationCollector};

/// A tracked inventory item.
///
/// Owned by its creator: deleting the user cascades to their items.
/// `date_added` is set once at creation; `last_updated` moves on every
/// mutation. Default listing order is `name` ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub price: Decimal,
    pub category: Option<CategoryId>,
    pub created_by: UserId,
    pub date_added: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Input for creating an item. Validated before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub price: Decimal,
    pub category: Option<CategoryId>,
}

impl NewItem {
    pub fn validate(&self) -> DomainResult<()> {
        let mut v = ValidationCollector::new();
        if self.name.trim().is_empty() {
            v.reject("name", "name cannot be empty");
        }
        if self.quantity < 0 {
            v.reject("quantity", "quantity cannot be negative");
        }
        if self.price < Decimal::ZERO {
            v.reject("price", "price cannot be negative");
        }
        v.finish()
    }

    /// Materialize the validated input into a persisted-shaped item.
    pub fn into_item(self, id: ItemId, created_by: UserId, now: DateTime<Utc>) -> InventoryItem {
        InventoryItem {
            id,
            name: self.name,
            description: self.description,
            quantity: self.quantity,
            price: self.price,
            category: self.category,
            created_by,
            date_added: now,
            last_updated: now,
        }
    }
}

/// Partial update for an item. `None` fields are left unchanged.
///
/// A full (PUT-style) update is just a patch with every field present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Decimal>,
    pub category: Option<Option<CategoryId>>,
}

impl ItemPatch {
    pub fn validate(&self) -> DomainResult<()> {
        let mut v = ValidationCollector::new();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                v.reject("name", "name cannot be empty");
            }
        }
        if let Some(quantity) = self.quantity {
            if quantity < 0 {
                v.reject("quantity", "quantity cannot be negative");
            }
        }
        if let Some(price) = self.price {
            if price < Decimal::ZERO {
                v.reject("price", "price cannot be negative");
            }
        }
        v.finish()
    }

    /// Apply the patch in place, bumping `last_updated`.
    ///
    /// `date_added` and `created_by` are immutable and never touched.
    pub fn apply(&self, item: &mut InventoryItem, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = Some(description.clone());
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        item.last_updated = now;
    }
}
