//! Read models returned by the store.
//!
//! Flat records mirroring the entity fields, with foreign users rendered as
//! display names (the username, or the raw id string when the directory has
//! no record for it).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stocktrail_core::{CategoryId, ChangeId, ItemId, UserId};
use stocktrail_inventory::{ChangeType, InventoryChange, InventoryItem};

/// Item as served to callers. `created_by` is the creator's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub price: Decimal,
    pub category: Option<CategoryId>,
    pub created_by: String,
    pub date_added: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl ItemView {
    pub fn from_item(item: InventoryItem, created_by: String) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            quantity: item.quantity,
            price: item.price,
            category: item.category,
            created_by,
            date_added: item.date_added,
            last_updated: item.last_updated,
        }
    }
}

/// Audit record as served to callers.
///
/// Carries the item id plus `item_name` and the acting user's display name.
/// The name reflects the live item when it still exists, else the snapshot
/// taken when the change was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeView {
    pub id: ChangeId,
    pub item: ItemId,
    pub item_name: String,
    pub user: String,
    pub user_id: UserId,
    pub change_type: ChangeType,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub change_amount: i64,
    pub timestamp: DateTime<Utc>,
    pub notes: String,
}

impl ChangeView {
    pub fn from_change(change: InventoryChange, item_name: String, user: String) -> Self {
        Self {
            id: change.id,
            item: change.item,
            item_name,
            user,
            user_id: change.user,
            change_type: change.change_type,
            previous_quantity: change.previous_quantity,
            new_quantity: change.new_quantity,
            change_amount: change.change_amount,
            timestamp: change.timestamp,
            notes: change.notes,
        }
    }
}
