//! Postgres-backed store.
//!
//! ## Error mapping
//!
//! | PostgreSQL error code | StoreError | Scenario |
//! |---|---|---|
//! | `23505` (unique violation) | `Domain(Conflict)` | duplicate username / category name |
//! | `23503` (foreign key violation) | `Domain(Validation)` | unknown category reference |
//! | `23514` (check violation) | `Domain(Validation)` | negative quantity/price reaching the DB |
//! | other | `Backend` | connection, IO, pool failures |
//!
//! ## Atomicity
//!
//! Item mutations run in a single transaction: the current row is taken with
//! `SELECT ... FOR UPDATE`, the patch is applied, and the derived audit
//! record is inserted before commit. Two concurrent updates to the same item
//! therefore serialize and cannot interleave their previous/new quantities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, Postgres};
use sqlx::{FromRow, QueryBuilder};
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use async_trait::async_trait;

use stocktrail_auth::{NewUser, User, UserPatch, hash_password};
use stocktrail_core::{CategoryId, ChangeId, DomainError, ItemId, UserId};
use stocktrail_inventory::{
    Category, CategoryPatch, ChangeType, InventoryChange, InventoryItem, ItemPatch, NewCategory,
    NewItem, change_on_create, change_on_delete, change_on_update,
};

use crate::query::{ChangeFilter, ItemFilter, ItemOrdering, ItemSearch, ItemSortKey, Scope};
use crate::r#trait::{InventoryStore, StoreError, StoreResult};
use crate::view::{ChangeView, ItemView};

/// Postgres [`InventoryStore`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and run the embedded migrations.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(url)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx_error(op: &'static str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some("23505") => {
                return DomainError::conflict(match db.constraint() {
                    Some("users_username_key") => "username already taken",
                    Some("categories_name_key") => "category name already taken",
                    _ => "unique constraint violated",
                })
                .into();
            }
            Some("23503") => {
                return match db.constraint() {
                    Some("items_category_id_fkey") => {
                        DomainError::validation("category", "unknown category").into()
                    }
                    _ => StoreError::backend(format!("{op}: {err}")),
                };
            }
            Some("23514") => {
                return DomainError::validation("item", "constraint check failed").into();
            }
            _ => {}
        }
    }
    StoreError::backend(format!("{op}: {err}"))
}

/// Escape LIKE metacharacters so user input matches literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn item_order_sql(ordering: ItemOrdering) -> &'static str {
    match (ordering.key, ordering.descending) {
        (ItemSortKey::Name, false) => "i.name ASC, i.id ASC",
        (ItemSortKey::Name, true) => "i.name DESC, i.id DESC",
        (ItemSortKey::Quantity, false) => "i.quantity ASC, i.id ASC",
        (ItemSortKey::Quantity, true) => "i.quantity DESC, i.id DESC",
        (ItemSortKey::Price, false) => "i.price ASC, i.id ASC",
        (ItemSortKey::Price, true) => "i.price DESC, i.id DESC",
        (ItemSortKey::DateAdded, false) => "i.date_added ASC, i.id ASC",
        (ItemSortKey::DateAdded, true) => "i.date_added DESC, i.id DESC",
    }
}

// ── row types ────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    is_staff: bool,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: UserId::from_uuid(r.id),
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            is_staff: r.is_staff,
        }
    }
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Category {
            id: CategoryId::from_uuid(r.id),
            name: r.name,
            description: r.description,
        }
    }
}

const ITEM_SELECT: &str = "SELECT i.id, i.name, i.description, i.quantity, i.price, \
     i.category_id, i.created_by, i.date_added, i.last_updated, \
     COALESCE(u.username, i.created_by::text) AS created_by_name \
     FROM items i LEFT JOIN users u ON u.id = i.created_by";

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    quantity: i64,
    price: Decimal,
    category_id: Option<Uuid>,
    created_by: Uuid,
    date_added: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    created_by_name: String,
}

impl ItemRow {
    fn into_parts(self) -> (InventoryItem, String) {
        (
            InventoryItem {
                id: ItemId::from_uuid(self.id),
                name: self.name,
                description: self.description,
                quantity: self.quantity,
                price: self.price,
                category: self.category_id.map(CategoryId::from_uuid),
                created_by: UserId::from_uuid(self.created_by),
                date_added: self.date_added,
                last_updated: self.last_updated,
            },
            self.created_by_name,
        )
    }

    fn into_view(self) -> ItemView {
        let (item, created_by) = self.into_parts();
        ItemView::from_item(item, created_by)
    }
}

const CHANGE_SELECT: &str = "SELECT c.id, c.item_id, \
     COALESCE(i.name, c.item_name) AS item_name, \
     COALESCE(u.username, c.user_id::text) AS user_name, \
     c.user_id, c.change_type, c.previous_quantity, c.new_quantity, \
     c.change_amount, c.timestamp, c.notes \
     FROM changes c \
     LEFT JOIN items i ON i.id = c.item_id \
     LEFT JOIN users u ON u.id = c.user_id";

#[derive(Debug, FromRow)]
struct ChangeRow {
    id: Uuid,
    item_id: Uuid,
    item_name: String,
    user_name: String,
    user_id: Uuid,
    change_type: String,
    previous_quantity: i64,
    new_quantity: i64,
    change_amount: i64,
    timestamp: DateTime<Utc>,
    notes: String,
}

impl ChangeRow {
    fn into_view(self) -> StoreResult<ChangeView> {
        let change_type = ChangeType::from_str(&self.change_type)
            .map_err(|_| StoreError::backend(format!("bad change_type row: {}", self.change_type)))?;
        Ok(ChangeView {
            id: ChangeId::from_uuid(self.id),
            item: ItemId::from_uuid(self.item_id),
            item_name: self.item_name,
            user: self.user_name,
            user_id: UserId::from_uuid(self.user_id),
            change_type,
            previous_quantity: self.previous_quantity,
            new_quantity: self.new_quantity,
            change_amount: self.change_amount,
            timestamp: self.timestamp,
            notes: self.notes,
        })
    }
}

async fn insert_change<'e, E>(executor: E, change: &InventoryChange, item_name: &str, item_owner: UserId) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "INSERT INTO changes (id, item_id, item_name, item_owner, user_id, change_type, \
         previous_quantity, new_quantity, change_amount, timestamp, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(change.id.as_uuid())
    .bind(change.item.as_uuid())
    .bind(item_name)
    .bind(item_owner.as_uuid())
    .bind(change.user.as_uuid())
    .bind(change.change_type.as_str())
    .bind(change.previous_quantity)
    .bind(change.new_quantity)
    .bind(change.change_amount)
    .bind(change.timestamp)
    .bind(&change.notes)
    .execute(executor)
    .await
    .map(|_| ())
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: Scope, column: &str) {
    if let Scope::Owner(user) = scope {
        qb.push(" AND ").push(column).push(" = ").push_bind(*user.as_uuid());
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    #[instrument(skip(self, new), err)]
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        new.validate()?;
        let password_hash =
            hash_password(&new.password).map_err(|e| StoreError::backend(e.to_string()))?;
        let id = UserId::new();

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, is_staff) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id.as_uuid())
        .bind(&new.username)
        .bind(&new.email)
        .bind(&password_hash)
        .bind(new.is_staff)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        Ok(User {
            id,
            username: new.username,
            email: new.email,
            password_hash,
            is_staff: new.is_staff,
        })
    }

    #[instrument(skip(self), err)]
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash, is_staff FROM users ORDER BY username",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash, is_staff FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_user", e))?;
        row.map(User::from)
            .ok_or_else(|| DomainError::not_found().into())
    }

    #[instrument(skip(self, patch), fields(user_id = %id), err)]
    async fn update_user(&self, id: UserId, patch: UserPatch) -> StoreResult<User> {
        patch.validate()?;
        let password_hash = match &patch.password {
            Some(password) => {
                Some(hash_password(password).map_err(|e| StoreError::backend(e.to_string()))?)
            }
            None => None,
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;

        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash, is_staff FROM users \
             WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        let mut user: User = row.map(User::from).ok_or(DomainError::NotFound)?;

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

        sqlx::query(
            "UPDATE users SET username = $2, email = $3, password_hash = $4, is_staff = $5 \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;

        // Owning relation: the user's items go with them, as do audit
        // records they authored or that describe their items.
        sqlx::query("DELETE FROM changes WHERE item_owner = $1 OR user_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;

        sqlx::query("DELETE FROM items WHERE created_by = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found().into());
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(())
    }

    #[instrument(skip(self, new), err)]
    async fn create_category(&self, new: NewCategory) -> StoreResult<Category> {
        new.validate()?;
        let category = Category {
            id: CategoryId::new(),
            name: new.name,
            description: new.description,
        };

        sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(&category.description)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_category", e))?;
        Ok(category)
    }

    #[instrument(skip(self), err)]
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, name, description FROM categories ORDER BY name")
                .fetch_all(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("list_categories", e))?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn get_category(&self, id: CategoryId) -> StoreResult<Category> {
        let row: Option<CategoryRow> =
            sqlx::query_as("SELECT id, name, description FROM categories WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("get_category", e))?;
        row.map(Category::from)
            .ok_or_else(|| DomainError::not_found().into())
    }

    #[instrument(skip(self, patch), fields(category_id = %id), err)]
    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> StoreResult<Category> {
        patch.validate()?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_category", e))?;

        let row: Option<CategoryRow> =
            sqlx::query_as("SELECT id, name, description FROM categories WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("update_category", e))?;
        let mut category: Category = row.map(Category::from).ok_or(DomainError::NotFound)?;
        patch.apply(&mut category);

        sqlx::query("UPDATE categories SET name = $2, description = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(&category.name)
            .bind(&category.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_category", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_category", e))?;
        Ok(category)
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        // Referencing items are nulled by the FK's ON DELETE SET NULL.
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    #[instrument(skip(self, new), fields(actor = %actor), err)]
    async fn create_item(&self, actor: UserId, new: NewItem) -> StoreResult<ItemView> {
        new.validate()?;
        let now = Utc::now();
        let item = new.into_item(ItemId::new(), actor, now);
        let change = InventoryChange::record(change_on_create(item.quantity), item.id, actor, now);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_item", e))?;

        sqlx::query(
            "INSERT INTO items (id, name, description, quantity, price, category_id, \
             created_by, date_added, last_updated) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.category.map(|c| *c.as_uuid()))
        .bind(item.created_by.as_uuid())
        .bind(item.date_added)
        .bind(item.last_updated)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_item", e))?;

        insert_change(&mut *tx, &change, &item.name, actor)
            .await
            .map_err(|e| map_sqlx_error("create_item", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_item", e))?;

        let username: Option<String> = sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
            .bind(actor.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_item", e))?;
        Ok(ItemView::from_item(
            item,
            username.unwrap_or_else(|| actor.to_string()),
        ))
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn get_item(&self, scope: Scope, id: ItemId) -> StoreResult<ItemView> {
        let mut qb = QueryBuilder::<Postgres>::new(ITEM_SELECT);
        qb.push(" WHERE i.id = ").push_bind(*id.as_uuid());
        push_scope(&mut qb, scope, "i.created_by");

        let row: Option<ItemRow> = qb
            .build_query_as()
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_item", e))?;
        row.map(ItemRow::into_view)
            .ok_or_else(|| DomainError::not_found().into())
    }

    #[instrument(skip(self, filter), err)]
    async fn list_items(&self, scope: Scope, filter: ItemFilter) -> StoreResult<Vec<ItemView>> {
        let mut qb = QueryBuilder::<Postgres>::new(ITEM_SELECT);
        qb.push(" WHERE TRUE");
        push_scope(&mut qb, scope, "i.created_by");
        if let Some(category) = filter.category {
            qb.push(" AND i.category_id = ").push_bind(*category.as_uuid());
        }
        if let Some(quantity) = filter.quantity {
            qb.push(" AND i.quantity = ").push_bind(quantity);
        }
        if let Some(needle) = &filter.search {
            let pattern = like_pattern(needle);
            qb.push(" AND (i.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR i.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY ").push(item_order_sql(filter.ordering));

        let rows: Vec<ItemRow> = qb
            .build_query_as()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_items", e))?;
        Ok(rows.into_iter().map(ItemRow::into_view).collect())
    }

    #[instrument(skip(self, search), err)]
    async fn search_items(&self, scope: Scope, search: ItemSearch) -> StoreResult<Vec<ItemView>> {
        let mut qb = QueryBuilder::<Postgres>::new(ITEM_SELECT);
        qb.push(" WHERE TRUE");
        push_scope(&mut qb, scope, "i.created_by");
        if let Some(needle) = &search.q {
            let pattern = like_pattern(needle);
            qb.push(" AND (i.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR i.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category) = &search.category {
            // Exact category name; an unknown name matches nothing.
            qb.push(" AND i.category_id IN (SELECT id FROM categories WHERE name = ")
                .push_bind(category.clone())
                .push(")");
        }
        if let Some(min_price) = search.min_price {
            qb.push(" AND i.price >= ").push_bind(min_price);
        }
        if let Some(max_price) = search.max_price {
            qb.push(" AND i.price <= ").push_bind(max_price);
        }
        qb.push(" ORDER BY ").push(item_order_sql(ItemOrdering::default()));

        let rows: Vec<ItemRow> = qb
            .build_query_as()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("search_items", e))?;
        Ok(rows.into_iter().map(ItemRow::into_view).collect())
    }

    #[instrument(skip(self), err)]
    async fn low_stock(&self, scope: Scope, threshold: i64) -> StoreResult<Vec<ItemView>> {
        let mut qb = QueryBuilder::<Postgres>::new(ITEM_SELECT);
        qb.push(" WHERE i.quantity <= ").push_bind(threshold);
        push_scope(&mut qb, scope, "i.created_by");
        qb.push(" ORDER BY ").push(item_order_sql(ItemOrdering::default()));

        let rows: Vec<ItemRow> = qb
            .build_query_as()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("low_stock", e))?;
        Ok(rows.into_iter().map(ItemRow::into_view).collect())
    }

    #[instrument(skip(self, patch), fields(item_id = %id, actor = %actor), err)]
    async fn update_item(
        &self,
        actor: UserId,
        scope: Scope,
        id: ItemId,
        patch: ItemPatch,
    ) -> StoreResult<ItemView> {
        patch.validate()?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_item", e))?;

        // Row lock: the read-modify-write and the audit insert commit as one.
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT i.id, i.name, i.description, i.quantity, i.price, i.category_id, \
             i.created_by, i.date_added, i.last_updated, i.created_by::text AS created_by_name \
             FROM items i",
        );
        qb.push(" WHERE i.id = ").push_bind(*id.as_uuid());
        push_scope(&mut qb, scope, "i.created_by");
        qb.push(" FOR UPDATE");

        let row: Option<ItemRow> = qb
            .build_query_as()
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_item", e))?;
        let (mut item, _) = row.ok_or(DomainError::NotFound)?.into_parts();

        let now = Utc::now();
        let old_quantity = item.quantity;
        patch.apply(&mut item, now);

        sqlx::query(
            "UPDATE items SET name = $2, description = $3, quantity = $4, price = $5, \
             category_id = $6, last_updated = $7 WHERE id = $1",
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.category.map(|c| *c.as_uuid()))
        .bind(item.last_updated)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        let change =
            InventoryChange::record(change_on_update(old_quantity, item.quantity), id, actor, now);
        insert_change(&mut *tx, &change, &item.name, item.created_by)
            .await
            .map_err(|e| map_sqlx_error("update_item", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_item", e))?;

        let username: Option<String> = sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
            .bind(item.created_by.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_item", e))?;
        let created_by = username.unwrap_or_else(|| item.created_by.to_string());
        Ok(ItemView::from_item(item, created_by))
    }

    #[instrument(skip(self), fields(item_id = %id, actor = %actor), err)]
    async fn delete_item(&self, actor: UserId, scope: Scope, id: ItemId) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT i.name, i.quantity, i.created_by FROM items i",
        );
        qb.push(" WHERE i.id = ").push_bind(*id.as_uuid());
        push_scope(&mut qb, scope, "i.created_by");
        qb.push(" FOR UPDATE");

        let row: Option<(String, i64, Uuid)> = qb
            .build_query_as()
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;
        let (name, quantity, owner) = row.ok_or(DomainError::NotFound)?;

        let change =
            InventoryChange::record(change_on_delete(quantity), id, actor, Utc::now());
        insert_change(&mut *tx, &change, &name, UserId::from_uuid(owner))
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;
        Ok(())
    }

    #[instrument(skip(self, filter), err)]
    async fn list_changes(
        &self,
        scope: Scope,
        filter: ChangeFilter,
    ) -> StoreResult<Vec<ChangeView>> {
        let mut qb = QueryBuilder::<Postgres>::new(CHANGE_SELECT);
        qb.push(" WHERE TRUE");
        push_scope(&mut qb, scope, "c.item_owner");
        if let Some(item) = filter.item {
            qb.push(" AND c.item_id = ").push_bind(*item.as_uuid());
        }
        if let Some(change_type) = filter.change_type {
            qb.push(" AND c.change_type = ").push_bind(change_type.as_str());
        }
        if let Some(user) = filter.user {
            qb.push(" AND c.user_id = ").push_bind(*user.as_uuid());
        }
        // Change ids are UUIDv7, so id breaks timestamp ties in record order.
        qb.push(if filter.descending {
            " ORDER BY c.timestamp DESC, c.id DESC"
        } else {
            " ORDER BY c.timestamp ASC, c.id ASC"
        });

        let rows: Vec<ChangeRow> = qb
            .build_query_as()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_changes", e))?;
        rows.into_iter().map(ChangeRow::into_view).collect()
    }

    #[instrument(skip(self), fields(change_id = %id), err)]
    async fn get_change(&self, scope: Scope, id: ChangeId) -> StoreResult<ChangeView> {
        let mut qb = QueryBuilder::<Postgres>::new(CHANGE_SELECT);
        qb.push(" WHERE c.id = ").push_bind(*id.as_uuid());
        push_scope(&mut qb, scope, "c.item_owner");

        let row: Option<ChangeRow> = qb
            .build_query_as()
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_change", e))?;
        row.ok_or_else(|| StoreError::from(DomainError::not_found()))?
            .into_view()
    }
}
