//! In-memory store.
//!
//! Intended for tests/dev. A single mutex guards all tables, which makes the
//! item-mutation + audit-record pairing trivially atomic.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use stocktrail_auth::{NewUser, User, UserPatch, hash_password};
use stocktrail_core::{CategoryId, ChangeId, DomainError, ItemId, UserId};
use stocktrail_inventory::{
    Category, CategoryPatch, InventoryChange, InventoryItem, ItemPatch, NewCategory, NewItem,
    change_on_create, change_on_delete, change_on_update,
};

use crate::query::{ChangeFilter, ItemFilter, ItemOrdering, ItemSearch, ItemSortKey, Scope};
use crate::r#trait::{InventoryStore, StoreError, StoreResult};
use crate::view::{ChangeView, ItemView};

/// An audit record plus the snapshots that keep it renderable and scopable
/// after its item is gone.
#[derive(Debug, Clone)]
struct ChangeRow {
    change: InventoryChange,
    item_name: String,
    item_owner: UserId,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    categories: HashMap<CategoryId, Category>,
    items: HashMap<ItemId, InventoryItem>,
    changes: Vec<ChangeRow>,
}

impl State {
    fn display_name(&self, user: UserId) -> String {
        self.users
            .get(&user)
            .map(|u| u.username.clone())
            .unwrap_or_else(|| user.to_string())
    }

    fn item_view(&self, item: &InventoryItem) -> ItemView {
        ItemView::from_item(item.clone(), self.display_name(item.created_by))
    }

    fn change_view(&self, row: &ChangeRow) -> ChangeView {
        // Live item name when the item still exists, else the snapshot.
        let item_name = self
            .items
            .get(&row.change.item)
            .map(|i| i.name.clone())
            .unwrap_or_else(|| row.item_name.clone());
        ChangeView::from_change(row.change.clone(), item_name, self.display_name(row.change.user))
    }

    fn username_taken(&self, username: &str, excluding: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != excluding)
    }

    fn category_name_taken(&self, name: &str, excluding: Option<CategoryId>) -> bool {
        self.categories
            .values()
            .any(|c| c.name == name && Some(c.id) != excluding)
    }

    fn ensure_category_exists(&self, id: CategoryId) -> StoreResult<()> {
        if self.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(DomainError::validation("category", "unknown category").into())
        }
    }

    /// Fetch an item visible to the scope; foreign and absent ids are
    /// indistinguishable (NotFound).
    fn scoped_item(&self, scope: Scope, id: ItemId) -> StoreResult<&InventoryItem> {
        self.items
            .get(&id)
            .filter(|item| scope.permits(item.created_by))
            .ok_or_else(|| DomainError::not_found().into())
    }
}

/// In-memory [`InventoryStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }
}

fn sort_items(items: &mut [InventoryItem], ordering: ItemOrdering) {
    items.sort_by(|a, b| {
        let ord = match ordering.key {
            ItemSortKey::Name => a.name.cmp(&b.name),
            ItemSortKey::Quantity => a.quantity.cmp(&b.quantity),
            ItemSortKey::Price => a.price.cmp(&b.price),
            ItemSortKey::DateAdded => a.date_added.cmp(&b.date_added),
        };
        if ordering.descending { ord.reverse() } else { ord }
    });
}

fn matches_substring(item: &InventoryItem, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    item.name.to_lowercase().contains(&needle)
        || item
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        new.validate()?;
        let mut state = self.lock()?;
        if state.username_taken(&new.username, None) {
            return Err(DomainError::conflict("username already taken").into());
        }

        let user = User {
            id: UserId::new(),
            username: new.username,
            email: new.email,
            password_hash: hash_password(&new.password)
                .map_err(|e| StoreError::backend(e.to_string()))?,
            is_staff: new.is_staff,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let state = self.lock()?;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        let state = self.lock()?;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found().into())
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> StoreResult<User> {
        patch.validate()?;
        let mut state = self.lock()?;
        if let Some(username) = &patch.username {
            if state.username_taken(username, Some(id)) {
                return Err(DomainError::conflict("username already taken").into());
            }
        }

        let password_hash = match &patch.password {
            Some(password) => {
                Some(hash_password(password).map_err(|e| StoreError::backend(e.to_string()))?)
            }
            None => None,
        };

        let user = state
            .users
            .get_mut(&id)
            .ok_or(DomainError::NotFound)?;
        if let Some(username) = patch.username {
            user.username = username;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        if let Some(is_staff) = patch.is_staff {
            user.is_staff = is_staff;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let mut state = self.lock()?;
        if state.users.remove(&id).is_none() {
            return Err(DomainError::not_found().into());
        }
        // Owning relation: the user's items go with them, as do audit
        // records they authored or that describe their items.
        state.items.retain(|_, item| item.created_by != id);
        state
            .changes
            .retain(|row| row.change.user != id && row.item_owner != id);
        Ok(())
    }

    async fn create_category(&self, new: NewCategory) -> StoreResult<Category> {
        new.validate()?;
        let mut state = self.lock()?;
        if state.category_name_taken(&new.name, None) {
            return Err(DomainError::conflict("category name already taken").into());
        }

        let category = Category {
            id: CategoryId::new(),
            name: new.name,
            description: new.description,
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let state = self.lock()?;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Category> {
        let state = self.lock()?;
        state
            .categories
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found().into())
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> StoreResult<Category> {
        patch.validate()?;
        let mut state = self.lock()?;
        if let Some(name) = &patch.name {
            if state.category_name_taken(name, Some(id)) {
                return Err(DomainError::conflict("category name already taken").into());
            }
        }

        let category = state
            .categories
            .get_mut(&id)
            .ok_or(DomainError::NotFound)?;
        patch.apply(category);
        Ok(category.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        let mut state = self.lock()?;
        if state.categories.remove(&id).is_none() {
            return Err(DomainError::not_found().into());
        }
        // Referencing items keep living with a nulled category.
        for item in state.items.values_mut() {
            if item.category == Some(id) {
                item.category = None;
            }
        }
        Ok(())
    }

    async fn create_item(&self, actor: UserId, new: NewItem) -> StoreResult<ItemView> {
        new.validate()?;
        let mut state = self.lock()?;
        if let Some(category) = new.category {
            state.ensure_category_exists(category)?;
        }

        let now = Utc::now();
        let item = new.into_item(ItemId::new(), actor, now);
        let change = InventoryChange::record(change_on_create(item.quantity), item.id, actor, now);

        state.changes.push(ChangeRow {
            change,
            item_name: item.name.clone(),
            item_owner: actor,
        });
        let view = state.item_view(&item);
        state.items.insert(item.id, item);
        Ok(view)
    }

    async fn get_item(&self, scope: Scope, id: ItemId) -> StoreResult<ItemView> {
        let state = self.lock()?;
        let item = state.scoped_item(scope, id)?;
        Ok(state.item_view(item))
    }

    async fn list_items(&self, scope: Scope, filter: ItemFilter) -> StoreResult<Vec<ItemView>> {
        let state = self.lock()?;
        let mut items: Vec<InventoryItem> = state
            .items
            .values()
            .filter(|item| scope.permits(item.created_by))
            .filter(|item| filter.category.is_none_or(|c| item.category == Some(c)))
            .filter(|item| filter.quantity.is_none_or(|q| item.quantity == q))
            .filter(|item| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|needle| matches_substring(item, needle))
            })
            .cloned()
            .collect();
        sort_items(&mut items, filter.ordering);
        Ok(items.iter().map(|i| state.item_view(i)).collect())
    }

    async fn search_items(&self, scope: Scope, search: ItemSearch) -> StoreResult<Vec<ItemView>> {
        let state = self.lock()?;
        // An unknown category name matches nothing, mirroring an inner join.
        let category_id = search
            .category
            .as_deref()
            .map(|name| state.categories.values().find(|c| c.name == name).map(|c| c.id));

        let mut items: Vec<InventoryItem> = state
            .items
            .values()
            .filter(|item| scope.permits(item.created_by))
            .filter(|item| {
                search
                    .q
                    .as_deref()
                    .is_none_or(|needle| matches_substring(item, needle))
            })
            .filter(|item| match category_id {
                None => true,
                Some(None) => false,
                Some(Some(id)) => item.category == Some(id),
            })
            .filter(|item| search.min_price.is_none_or(|min| item.price >= min))
            .filter(|item| search.max_price.is_none_or(|max| item.price <= max))
            .cloned()
            .collect();
        sort_items(&mut items, Default::default());
        Ok(items.iter().map(|i| state.item_view(i)).collect())
    }

    async fn low_stock(&self, scope: Scope, threshold: i64) -> StoreResult<Vec<ItemView>> {
        let state = self.lock()?;
        let mut items: Vec<InventoryItem> = state
            .items
            .values()
            .filter(|item| scope.permits(item.created_by))
            .filter(|item| item.quantity <= threshold)
            .cloned()
            .collect();
        sort_items(&mut items, Default::default());
        Ok(items.iter().map(|i| state.item_view(i)).collect())
    }

    async fn update_item(
        &self,
        actor: UserId,
        scope: Scope,
        id: ItemId,
        patch: ItemPatch,
    ) -> StoreResult<ItemView> {
        patch.validate()?;
        let mut state = self.lock()?;
        if let Some(Some(category)) = patch.category {
            state.ensure_category_exists(category)?;
        }
        state.scoped_item(scope, id)?;

        let now = Utc::now();
        let item = state
            .items
            .get_mut(&id)
            .ok_or(DomainError::NotFound)?;
        let old_quantity = item.quantity;
        patch.apply(item, now);

        let change = InventoryChange::record(
            change_on_update(old_quantity, item.quantity),
            id,
            actor,
            now,
        );
        let row = ChangeRow {
            change,
            item_name: item.name.clone(),
            item_owner: item.created_by,
        };
        let item = item.clone();
        state.changes.push(row);
        Ok(state.item_view(&item))
    }

    async fn delete_item(&self, actor: UserId, scope: Scope, id: ItemId) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.scoped_item(scope, id)?;

        let item = state.items.remove(&id).ok_or(DomainError::NotFound)?;
        let change =
            InventoryChange::record(change_on_delete(item.quantity), id, actor, Utc::now());
        state.changes.push(ChangeRow {
            change,
            item_name: item.name,
            item_owner: item.created_by,
        });
        Ok(())
    }

    async fn list_changes(
        &self,
        scope: Scope,
        filter: ChangeFilter,
    ) -> StoreResult<Vec<ChangeView>> {
        let state = self.lock()?;
        // Enumerate to break timestamp ties by insertion order.
        let mut rows: Vec<(usize, &ChangeRow)> = state
            .changes
            .iter()
            .enumerate()
            .filter(|(_, row)| scope.permits(row.item_owner))
            .filter(|(_, row)| filter.item.is_none_or(|i| row.change.item == i))
            .filter(|(_, row)| filter.change_type.is_none_or(|t| row.change.change_type == t))
            .filter(|(_, row)| filter.user.is_none_or(|u| row.change.user == u))
            .collect();

        rows.sort_by(|(ai, a), (bi, b)| {
            let ord = (a.change.timestamp, *ai).cmp(&(b.change.timestamp, *bi));
            if filter.descending { ord.reverse() } else { ord }
        });
        Ok(rows.iter().map(|(_, row)| state.change_view(row)).collect())
    }

    async fn get_change(&self, scope: Scope, id: ChangeId) -> StoreResult<ChangeView> {
        let state = self.lock()?;
        state
            .changes
            .iter()
            .find(|row| row.change.id == id && scope.permits(row.item_owner))
            .map(|row| state.change_view(row))
            .ok_or_else(|| DomainError::not_found().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use stocktrail_inventory::ChangeType;

    fn new_item(name: &str, quantity: i64, price: i64) -> NewItem {
        NewItem {
            name: name.to_string(),
            description: None,
            quantity,
            price: Decimal::new(price, 2),
            category: None,
        }
    }

    async fn all_changes(store: &MemoryStore) -> Vec<ChangeView> {
        store
            .list_changes(Scope::All, ChangeFilter::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_logs_exactly_one_create_change() {
        let store = MemoryStore::new();
        let actor = UserId::new();

        let item = store
            .create_item(actor, new_item("Widget", 5, 100))
            .await
            .unwrap();

        let changes = all_changes(&store).await;
        assert_eq!(changes.len(), 1);
        let c = &changes[0];
        assert_eq!(c.change_type, ChangeType::Create);
        assert_eq!(c.previous_quantity, 0);
        assert_eq!(c.new_quantity, 5);
        assert_eq!(c.change_amount, 5);
        assert_eq!(c.item, item.id);
        assert_eq!(c.notes, "Item created");
    }

    #[tokio::test]
    async fn lifecycle_yields_three_changes_newest_first() {
        let store = MemoryStore::new();
        let actor = UserId::new();

        let item = store
            .create_item(actor, new_item("Widget", 5, 100))
            .await
            .unwrap();
        store
            .update_item(
                actor,
                Scope::Owner(actor),
                item.id,
                ItemPatch {
                    quantity: Some(2),
                    ..ItemPatch::default()
                },
            )
            .await
            .unwrap();
        store
            .delete_item(actor, Scope::Owner(actor), item.id)
            .await
            .unwrap();

        // Item is unretrievable afterward.
        assert!(matches!(
            store.get_item(Scope::All, item.id).await,
            Err(StoreError::Domain(DomainError::NotFound))
        ));

        // The trail survives deletion, newest first.
        let changes = all_changes(&store).await;
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].change_type, ChangeType::Delete);
        assert_eq!(changes[0].previous_quantity, 2);
        assert_eq!(changes[0].new_quantity, 0);
        assert_eq!(changes[0].change_amount, -2);
        assert_eq!(changes[1].change_type, ChangeType::Remove);
        assert_eq!(changes[1].change_amount, -3);
        assert_eq!(changes[2].change_type, ChangeType::Create);
        assert_eq!(changes[0].item_name, "Widget");
    }

    #[tokio::test]
    async fn quantity_neutral_update_logs_update_with_zero_amount() {
        let store = MemoryStore::new();
        let actor = UserId::new();
        let item = store
            .create_item(actor, new_item("Widget", 5, 100))
            .await
            .unwrap();

        store
            .update_item(
                actor,
                Scope::All,
                item.id,
                ItemPatch {
                    description: Some("blue".to_string()),
                    ..ItemPatch::default()
                },
            )
            .await
            .unwrap();

        let changes = all_changes(&store).await;
        assert_eq!(changes[0].change_type, ChangeType::Update);
        assert_eq!(changes[0].previous_quantity, 5);
        assert_eq!(changes[0].new_quantity, 5);
        assert_eq!(changes[0].change_amount, 0);
        assert_eq!(changes[0].notes, "Item details updated");
    }

    #[tokio::test]
    async fn invalid_item_persists_nothing() {
        let store = MemoryStore::new();
        let actor = UserId::new();

        let err = store
            .create_item(actor, new_item("Widget", -1, 100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::Validation(_))
        ));

        assert!(store.list_items(Scope::All, ItemFilter::default()).await.unwrap().is_empty());
        assert!(all_changes(&store).await.is_empty());
    }

    #[tokio::test]
    async fn owner_scope_hides_foreign_items_and_changes() {
        let store = MemoryStore::new();
        let alice = UserId::new();
        let bob = UserId::new();

        let a = store.create_item(alice, new_item("Anvil", 3, 500)).await.unwrap();
        store.create_item(bob, new_item("Bolt", 7, 10)).await.unwrap();

        let visible = store
            .list_items(Scope::Owner(alice), ItemFilter::default())
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, a.id);

        // A foreign id reads as absent, not forbidden.
        let bob_item = store
            .list_items(Scope::Owner(bob), ItemFilter::default())
            .await
            .unwrap()[0]
            .id;
        assert!(matches!(
            store.get_item(Scope::Owner(alice), bob_item).await,
            Err(StoreError::Domain(DomainError::NotFound))
        ));

        let changes = store
            .list_changes(Scope::Owner(alice), ChangeFilter::default())
            .await
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].item, a.id);
    }

    #[tokio::test]
    async fn low_stock_respects_threshold_and_name_order() {
        let store = MemoryStore::new();
        let actor = UserId::new();
        store.create_item(actor, new_item("Zinc", 4, 100)).await.unwrap();
        store.create_item(actor, new_item("Anvil", 10, 100)).await.unwrap();
        store.create_item(actor, new_item("Crate", 11, 100)).await.unwrap();

        let low = store.low_stock(Scope::All, 10).await.unwrap();
        let names: Vec<_> = low.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Anvil", "Zinc"]);
    }

    #[tokio::test]
    async fn list_filters_and_orderings_apply() {
        let store = MemoryStore::new();
        let actor = UserId::new();
        let tools = store
            .create_category(NewCategory {
                name: "Tools".to_string(),
                description: None,
            })
            .await
            .unwrap();

        store
            .create_item(
                actor,
                NewItem {
                    category: Some(tools.id),
                    ..new_item("Hammer", 3, 1500)
                },
            )
            .await
            .unwrap();
        store.create_item(actor, new_item("Nail pack", 3, 200)).await.unwrap();
        store.create_item(actor, new_item("Saw", 8, 1200)).await.unwrap();

        let by_category = store
            .list_items(
                Scope::All,
                ItemFilter {
                    category: Some(tools.id),
                    ..ItemFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].name, "Hammer");

        let by_quantity = store
            .list_items(
                Scope::All,
                ItemFilter {
                    quantity: Some(3),
                    ..ItemFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_quantity.len(), 2);

        let by_price_desc = store
            .list_items(
                Scope::All,
                ItemFilter {
                    ordering: ItemOrdering::parse("-price").unwrap(),
                    ..ItemFilter::default()
                },
            )
            .await
            .unwrap();
        let names: Vec<_> = by_price_desc.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Hammer", "Saw", "Nail pack"]);

        let substring = store
            .list_items(
                Scope::All,
                ItemFilter {
                    search: Some("nAiL".to_string()),
                    ..ItemFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(substring.len(), 1);
        assert_eq!(substring[0].name, "Nail pack");
    }

    #[tokio::test]
    async fn search_combines_filters_with_and_semantics() {
        let store = MemoryStore::new();
        let actor = UserId::new();
        let tools = store
            .create_category(NewCategory {
                name: "Tools".to_string(),
                description: None,
            })
            .await
            .unwrap();

        store
            .create_item(
                actor,
                NewItem {
                    description: Some("claw hammer".to_string()),
                    category: Some(tools.id),
                    ..new_item("Hammer", 3, 1500)
                },
            )
            .await
            .unwrap();
        store.create_item(actor, new_item("Hammock", 1, 3000)).await.unwrap();

        let hits = store
            .search_items(
                Scope::All,
                ItemSearch {
                    q: Some("hamm".to_string()),
                    category: Some("Tools".to_string()),
                    min_price: Some(Decimal::new(1000, 2)),
                    max_price: Some(Decimal::new(2000, 2)),
                },
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Hammer");

        // Unknown category name matches nothing.
        let none = store
            .search_items(
                Scope::All,
                ItemSearch {
                    category: Some("Garden".to_string()),
                    ..ItemSearch::default()
                },
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn category_delete_nulls_item_references() {
        let store = MemoryStore::new();
        let actor = UserId::new();
        let tools = store
            .create_category(NewCategory {
                name: "Tools".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let item = store
            .create_item(
                actor,
                NewItem {
                    category: Some(tools.id),
                    ..new_item("Hammer", 3, 1500)
                },
            )
            .await
            .unwrap();

        store.delete_category(tools.id).await.unwrap();

        let item = store.get_item(Scope::All, item.id).await.unwrap();
        assert_eq!(item.category, None);
    }

    #[tokio::test]
    async fn duplicate_category_name_conflicts() {
        let store = MemoryStore::new();
        let new = NewCategory {
            name: "Tools".to_string(),
            description: None,
        };
        store.create_category(new.clone()).await.unwrap();
        assert!(matches!(
            store.create_category(new).await,
            Err(StoreError::Domain(DomainError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn deleting_user_cascades_items_and_changes() {
        let store = MemoryStore::new();
        let alice = store
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "pw".to_string(),
                is_staff: false,
            })
            .await
            .unwrap();
        let other = UserId::new();

        let item = store.create_item(alice.id, new_item("Anvil", 3, 500)).await.unwrap();
        store.create_item(other, new_item("Bolt", 7, 10)).await.unwrap();

        store.delete_user(alice.id).await.unwrap();

        assert!(matches!(
            store.get_item(Scope::All, item.id).await,
            Err(StoreError::Domain(DomainError::NotFound))
        ));
        let remaining = store.list_items(Scope::All, ItemFilter::default()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        let changes = all_changes(&store).await;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].item_name, "Bolt");
    }

    #[tokio::test]
    async fn item_views_render_owner_username() {
        let store = MemoryStore::new();
        let alice = store
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "pw".to_string(),
                is_staff: false,
            })
            .await
            .unwrap();

        let item = store.create_item(alice.id, new_item("Anvil", 3, 500)).await.unwrap();
        assert_eq!(item.created_by, "alice");

        // Unprovisioned principals fall back to the raw id.
        let ghost = UserId::new();
        let item = store.create_item(ghost, new_item("Bolt", 7, 10)).await.unwrap();
        assert_eq!(item.created_by, ghost.to_string());
    }

    #[tokio::test]
    async fn change_filters_apply() {
        let store = MemoryStore::new();
        let actor = UserId::new();
        let other = UserId::new();

        let a = store.create_item(actor, new_item("Anvil", 3, 500)).await.unwrap();
        let b = store.create_item(other, new_item("Bolt", 7, 10)).await.unwrap();
        store
            .update_item(
                actor,
                Scope::All,
                a.id,
                ItemPatch {
                    quantity: Some(9),
                    ..ItemPatch::default()
                },
            )
            .await
            .unwrap();

        let by_item = store
            .list_changes(
                Scope::All,
                ChangeFilter {
                    item: Some(b.id),
                    ..ChangeFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_item.len(), 1);

        let adds = store
            .list_changes(
                Scope::All,
                ChangeFilter {
                    change_type: Some(ChangeType::Add),
                    ..ChangeFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(adds.len(), 1);
        assert_eq!(adds[0].change_amount, 6);

        let by_user = store
            .list_changes(
                Scope::All,
                ChangeFilter {
                    user: Some(other),
                    ..ChangeFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_user.len(), 1);
        assert_eq!(by_user[0].item, b.id);

        let ascending = store
            .list_changes(
                Scope::All,
                ChangeFilter {
                    descending: false,
                    ..ChangeFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ascending.first().unwrap().change_type, ChangeType::Create);
        assert_eq!(ascending.last().unwrap().change_type, ChangeType::Add);
    }
}
