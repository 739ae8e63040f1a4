//! Department of the user's current temporary list

use super::product::{DepartmentId, ProductRecord};

/// The department every further reservation must belong to
///
/// A temporary list may only hold products of one department. The context is
/// refreshed from the server after every list mutation and is empty whenever
/// the list is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentContext {
    department: Option<DepartmentId>,
    item_count: usize,
}

impl DepartmentContext {
    /// Build a context from a server snapshot
    ///
    /// An empty list never pins a department, whatever the server reports.
    pub fn new(department: Option<DepartmentId>, item_count: usize) -> Self {
        if item_count == 0 {
            return Self::cleared();
        }
        Self {
            department,
            item_count,
        }
    }

    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn department(&self) -> Option<&DepartmentId> {
        self.department.as_ref()
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn is_active(&self) -> bool {
        self.department.is_some()
    }

    /// Whether `record` belongs to a different department than the list
    pub fn locks(&self, record: &ProductRecord) -> bool {
        self.department
            .as_ref()
            .is_some_and(|department| *department != record.department)
    }
}
