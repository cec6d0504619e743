use serde::{Deserialize, Serialize};

use stocktrail_core::{CategoryId, DomainResult, ValidationCollector};

/// A grouping label for inventory items.
///
/// `name` is unique across the store. Deleting a category nulls the
/// `category` reference on items pointing at it; it never cascades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> DomainResult<()> {
        let mut v = ValidationCollector::new();
        if self.name.trim().is_empty() {
            v.reject("name", "name cannot be empty");
        }
        v.finish()
    }
}

/// Partial update for a category. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CategoryPatch {
    pub fn validate(&self) -> DomainResult<()> {
        let mut v = ValidationCollector::new();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                v.reject("name", "name cannot be empty");
            }
        }
        v.finish()
    }

    /// Apply the patch to an existing category.
    pub fn apply(&self, category: &mut Category) {
        if let Some(name) = &self.name {
            category.name = name.clone();
        }
        if let Some(description) = &self.description {
            category.description = Some(description.clone());
        }
    }
}
