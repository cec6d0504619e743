//! Query-surface types threaded into every store read.

use rust_decimal::Decimal;

use stocktrail_core::{CategoryId, DomainError, DomainResult, ItemId, UserId};
use stocktrail_inventory::ChangeType;

/// Visibility scope for a request.
///
/// Scoping is enforced by filtering the queried set, not by per-object
/// checks: a foreign id under `Owner` scope yields NotFound.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Staff/admin caller: all records.
    All,
    /// Non-staff caller: only records owned by this user.
    Owner(UserId),
}

impl Scope {
    pub fn permits(&self, owner: UserId) -> bool {
        match self {
            Scope::All => true,
            Scope::Owner(user) => *user == owner,
        }
    }
}

/// Sort key for item listings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ItemSortKey {
    Name,
    Quantity,
    Price,
    DateAdded,
}

/// Item ordering, parsed from `ordering` query values like `"price"` or
/// `"-date_added"`. Unknown keys are rejected at the boundary.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ItemOrdering {
    pub key: ItemSortKey,
    pub descending: bool,
}

impl Default for ItemOrdering {
    fn default() -> Self {
        Self {
            key: ItemSortKey::Name,
            descending: false,
        }
    }
}

impl ItemOrdering {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let (descending, key) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let key = match key {
            "name" => ItemSortKey::Name,
            "quantity" => ItemSortKey::Quantity,
            "price" => ItemSortKey::Price,
            "date_added" => ItemSortKey::DateAdded,
            other => {
                return Err(DomainError::validation(
                    "ordering",
                    format!(
                        "unknown ordering '{other}'; expected one of name, quantity, price, date_added"
                    ),
                ));
            }
        };

        Ok(Self { key, descending })
    }
}

/// Filters for the item list endpoint. All present filters AND together.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Exact category id.
    pub category: Option<CategoryId>,
    /// Exact quantity.
    pub quantity: Option<i64>,
    /// Case-insensitive substring over name OR description.
    pub search: Option<String>,
    pub ordering: ItemOrdering,
}

/// Parameters of the dedicated item search action (AND semantics).
#[derive(Debug, Clone, Default)]
pub struct ItemSearch {
    /// Case-insensitive substring over name OR description.
    pub q: Option<String>,
    /// Exact category *name* (an unknown name matches nothing).
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Filters for the change list endpoint.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    pub item: Option<ItemId>,
    pub change_type: Option<ChangeType>,
    pub user: Option<UserId>,
    /// Timestamp ordering; newest-first by default.
    pub descending: bool,
}

impl Default for ChangeFilter {
    fn default() -> Self {
        Self {
            item: None,
            change_type: None,
            user: None,
            descending: true,
        }
    }
}

/// Parse the `ordering` value of the change list (`timestamp` or
/// `-timestamp`), returning whether the listing is descending.
pub fn parse_change_ordering(raw: &str) -> DomainResult<bool> {
    match raw {
        "timestamp" => Ok(false),
        "-timestamp" => Ok(true),
        other => Err(DomainError::validation(
            "ordering",
            format!("unknown ordering '{other}'; expected timestamp or -timestamp"),
        )),
    }
}
