//! Temporary list (cart) snapshots and mutation responses

use serde::{Deserialize, Serialize};

use super::{
    department::DepartmentContext,
    product::{DepartmentId, ProductId},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub product_id: ProductId,
    pub article: String,
    pub name: String,
    pub quantity: f64,
    pub price: f64,
    #[serde(default)]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListSnapshot {
    #[serde(default)]
    pub items: Vec<ListItem>,
    #[serde(default, alias = "totalSum")]
    pub total: f64,
    #[serde(default)]
    pub count: Option<usize>,
}

impl ListSnapshot {
    /// Number of positions in the list; older servers omit `count` for empty lists
    pub fn count(&self) -> usize {
        self.count.unwrap_or(self.items.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepartmentSnapshot {
    #[serde(default)]
    pub department: Option<DepartmentId>,
    #[serde(default)]
    pub count: Option<usize>,
}

/// List and department snapshots fetched together after a list mutation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListStatus {
    pub list: ListSnapshot,
    pub department: DepartmentSnapshot,
}

impl ListStatus {
    pub fn item_count(&self) -> usize {
        self.department.count.unwrap_or_else(|| self.list.count())
    }

    pub fn context(&self) -> DepartmentContext {
        DepartmentContext::new(self.department.department.clone(), self.item_count())
    }
}

/// Generic `{success, message}` answer of the list mutation endpoints
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MutationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckoutResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    /// The server archived the list and emptied it
    #[serde(default)]
    pub cleared: bool,
}

/// What happened to the temporary list, reported by cart code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMutation {
    Reserved,
    ItemUpdated,
    ItemDeleted,
    Cleared,
    CheckedOut,
}
