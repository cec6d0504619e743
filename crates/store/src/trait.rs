use async_trait::async_trait;
use thiserror::Error;

use stocktrail_auth::{NewUser, User, UserPatch};
use stocktrail_core::{CategoryId, ChangeId, DomainError, ItemId, UserId};
use stocktrail_inventory::{Category, CategoryPatch, ItemPatch, NewCategory, NewItem};

use crate::query::{ChangeFilter, ItemFilter, ItemSearch, Scope};
use crate::view::{ChangeView, ItemView};

/// Result type used across the store layer.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Deterministic domain failure (validation, not found, conflict).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Persistence backend failure (connection, IO, constraint mapping).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Persistence seam for the whole system.
///
/// Implementations must:
/// - validate inputs via the domain types before persisting anything
/// - enforce scoping by filtering the queried set (foreign ids → NotFound)
/// - pair every item mutation with its derived audit record atomically,
///   so a failure in either write leaves neither applied
/// - never expose a way to update or delete an `InventoryChange`
#[async_trait]
pub trait InventoryStore: Send + Sync {
    // ── users (admin-managed directory) ──────────────────────────────

    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn get_user(&self, id: UserId) -> StoreResult<User>;
    async fn update_user(&self, id: UserId, patch: UserPatch) -> StoreResult<User>;
    /// Deletes the user, their items, and the audit records tied to either.
    async fn delete_user(&self, id: UserId) -> StoreResult<()>;

    // ── categories ───────────────────────────────────────────────────

    async fn create_category(&self, new: NewCategory) -> StoreResult<Category>;
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn get_category(&self, id: CategoryId) -> StoreResult<Category>;
    async fn update_category(&self, id: CategoryId, patch: CategoryPatch)
    -> StoreResult<Category>;
    /// Nulls the `category` of referencing items; never cascades to them.
    async fn delete_category(&self, id: CategoryId) -> StoreResult<()>;

    // ── items ────────────────────────────────────────────────────────

    /// Create an item and its `CREATE` audit record.
    async fn create_item(&self, actor: UserId, new: NewItem) -> StoreResult<ItemView>;
    async fn get_item(&self, scope: Scope, id: ItemId) -> StoreResult<ItemView>;
    async fn list_items(&self, scope: Scope, filter: ItemFilter) -> StoreResult<Vec<ItemView>>;
    async fn search_items(&self, scope: Scope, search: ItemSearch) -> StoreResult<Vec<ItemView>>;
    /// Items with `quantity <= threshold`, name order.
    async fn low_stock(&self, scope: Scope, threshold: i64) -> StoreResult<Vec<ItemView>>;
    /// Update an item and log the derived `ADD`/`REMOVE`/`UPDATE` record.
    ///
    /// The read-modify-write runs under the store's atomicity unit, so two
    /// concurrent updates cannot interleave their previous/new quantities.
    async fn update_item(
        &self,
        actor: UserId,
        scope: Scope,
        id: ItemId,
        patch: ItemPatch,
    ) -> StoreResult<ItemView>;
    /// Delete an item, logging a `DELETE` record. The audit trail survives.
    async fn delete_item(&self, actor: UserId, scope: Scope, id: ItemId) -> StoreResult<()>;

    // ── changes (read-only) ──────────────────────────────────────────

    async fn list_changes(&self, scope: Scope, filter: ChangeFilter)
    -> StoreResult<Vec<ChangeView>>;
    async fn get_change(&self, scope: Scope, id: ChangeId) -> StoreResult<ChangeView>;
}

#[async_trait]
impl<S> InventoryStore for std::sync::Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        (**self).create_user(new).await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        (**self).list_users().await
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        (**self).get_user(id).await
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> StoreResult<User> {
        (**self).update_user(id, patch).await
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        (**self).delete_user(id).await
    }

    async fn create_category(&self, new: NewCategory) -> StoreResult<Category> {
        (**self).create_category(new).await
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        (**self).list_categories().await
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Category> {
        (**self).get_category(id).await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> StoreResult<Category> {
        (**self).update_category(id, patch).await
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        (**self).delete_category(id).await
    }

    async fn create_item(&self, actor: UserId, new: NewItem) -> StoreResult<ItemView> {
        (**self).create_item(actor, new).await
    }

    async fn get_item(&self, scope: Scope, id: ItemId) -> StoreResult<ItemView> {
        (**self).get_item(scope, id).await
    }

    async fn list_items(&self, scope: Scope, filter: ItemFilter) -> StoreResult<Vec<ItemView>> {
        (**self).list_items(scope, filter).await
    }

    async fn search_items(&self, scope: Scope, search: ItemSearch) -> StoreResult<Vec<ItemView>> {
        (**self).search_items(scope, search).await
    }

    async fn low_stock(&self, scope: Scope, threshold: i64) -> StoreResult<Vec<ItemView>> {
        (**self).low_stock(scope, threshold).await
    }

    async fn update_item(
        &self,
        actor: UserId,
        scope: Scope,
        id: ItemId,
        patch: ItemPatch,
    ) -> StoreResult<ItemView> {
        (**self).update_item(actor, scope, id, patch).await
    }

    async fn delete_item(&self, actor: UserId, scope: Scope, id: ItemId) -> StoreResult<()> {
        (**self).delete_item(actor, scope, id).await
    }

    async fn list_changes(
        &self,
        scope: Scope,
        filter: ChangeFilter,
    ) -> StoreResult<Vec<ChangeView>> {
        (**self).list_changes(scope, filter).await
    }

    async fn get_change(&self, scope: Scope, id: ChangeId) -> StoreResult<ChangeView> {
        (**self).get_change(scope, id).await
    }
}
