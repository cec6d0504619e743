//! `stocktrail-store` — persistence layer.
//!
//! The [`InventoryStore`] trait is the sole seam between the HTTP surface
//! and storage. Two implementations are provided: an in-memory store
//! (default; used by tests and local development) and a Postgres store
//! behind the `postgres` feature.
//!
//! Every item mutation derives its audit record with the domain rules and
//! commits both writes as one atomic unit.

pub mod in_memory;
pub mod query;
pub mod view;

mod r#trait;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::MemoryStore;
pub use query::{
    ChangeFilter, ItemFilter, ItemOrdering, ItemSearch, ItemSortKey, Scope, parse_change_ordering,
};
pub use r#trait::{InventoryStore, StoreError, StoreResult};
pub use view::{ChangeView, ItemView};

#[cfg(feature = "postgres")]
pub use postgres::PgStore;
