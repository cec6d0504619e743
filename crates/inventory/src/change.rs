//! The append-only audit trail.
//!
//! Every mutation of an [`crate::InventoryItem`] produces exactly one
//! [`InventoryChange`]. The derivation rules live here as pure functions so
//! stores can run them inside the same transaction as the item write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktrail_core::{ChangeId, ItemId, UserId};

/// Kind of change recorded in the audit trail.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    /// Quantity increased on update.
    Add,
    /// Quantity decreased on update.
    Remove,
    /// Reserved. No rule currently emits this value.
    Adjust,
    /// Item created.
    Create,
    /// Item updated without a quantity change.
    Update,
    /// Item deleted.
    Delete,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Add => "ADD",
            ChangeType::Remove => "REMOVE",
            ChangeType::Adjust => "ADJUST",
            ChangeType::Create => "CREATE",
            ChangeType::Update => "UPDATE",
            ChangeType::Delete => "DELETE",
        }
    }
}

impl core::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ChangeType {
    type Err = stocktrail_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADD" => Ok(ChangeType::Add),
            "REMOVE" => Ok(ChangeType::Remove),
            "ADJUST" => Ok(ChangeType::Adjust),
            "CREATE" => Ok(ChangeType::Create),
            "UPDATE" => Ok(ChangeType::Update),
            "DELETE" => Ok(ChangeType::Delete),
            other => Err(stocktrail_core::DomainError::validation(
                "change_type",
                format!("unknown change type: {other}"),
            )),
        }
    }
}

/// A committed audit record.
///
/// Append-only: nothing in the application updates or deletes one of these,
/// and they cascade away only when their item does. `change_amount` is
/// derived in [`InventoryChange::record`] and is never settable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryChange {
    pub id: ChangeId,
    pub item: ItemId,
    pub user: UserId,
    pub change_type: ChangeType,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub change_amount: i64,
    pub timestamp: DateTime<Utc>,
    pub notes: String,
}

impl InventoryChange {
    /// Materialize a draft against an item and acting user.
    ///
    /// The only constructor: `change_amount` is always
    /// `new_quantity - previous_quantity`.
    pub fn record(
        draft: ChangeDraft,
        item: ItemId,
        user: UserId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ChangeId::new(),
            item,
            user,
            change_type: draft.change_type,
            previous_quantity: draft.previous_quantity,
            new_quantity: draft.new_quantity,
            change_amount: draft.new_quantity - draft.previous_quantity,
            timestamp,
            notes: draft.notes.to_string(),
        }
    }
}

/// A derived change, not yet bound to an item/user/timestamp.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChangeDraft {
    pub change_type: ChangeType,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub notes: &'static str,
}

/// Rule: item created with quantity `q` logs `CREATE 0 -> q`.
pub fn change_on_create(quantity: i64) -> ChangeDraft {
    ChangeDraft {
        change_type: ChangeType::Create,
        previous_quantity: 0,
        new_quantity: quantity,
        notes: "Item created",
    }
}

/// Rule: item updated from `old` to `new` units.
///
/// Any nonzero delta logs `ADD`/`REMOVE`; a quantity-neutral update logs
/// `UPDATE`. `ADJUST` is never produced here.
pub fn change_on_update(old_quantity: i64, new_quantity: i64) -> ChangeDraft {
    use core::cmp::Ordering;

    match new_quantity.cmp(&old_quantity) {
        Ordering::Greater => ChangeDraft {
            change_type: ChangeType::Add,
            previous_quantity: old_quantity,
            new_quantity,
            notes: "Item updated",
        },
        Ordering::Less => ChangeDraft {
            change_type: ChangeType::Remove,
            previous_quantity: old_quantity,
            new_quantity,
            notes: "Item updated",
        },
        Ordering::Equal => ChangeDraft {
            change_type: ChangeType::Update,
            previous_quantity: old_quantity,
            new_quantity: old_quantity,
            notes: "Item details updated",
        },
    }
}

/// Rule: item deleted while holding `q` units logs `DELETE q -> 0`.
pub fn change_on_delete(quantity: i64) -> ChangeDraft {
    ChangeDraft {
        change_type: ChangeType::Delete,
        previous_quantity: quantity,
        new_quantity: 0,
        notes: "Item deleted",
    }
}
