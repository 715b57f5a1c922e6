// Category entity
// Flat labels for classifying transactions, with an optional parent for
// subcategories ("Food" → "Restaurants"). Names are unique across the tree.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Parent category id; `None` for root categories.
    pub parent_id: Option<i64>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
