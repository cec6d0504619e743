//! Inventory domain module.
//!
//! This crate contains business rules for categories, items and the
//! append-only audit trail, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod category;
pub mod change;
pub mod item;

pub use category::{Category, CategoryPatch, NewCategory};
pub use change::{
    ChangeDraft, ChangeType, InventoryChange, change_on_create, change_on_delete,
    change_on_update,
};
pub use item::{InventoryItem, ItemPatch, NewItem};
