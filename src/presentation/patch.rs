//! DOM patch operations
//!
//! The model never touches a document directly. It describes the change as a
//! list of [`DomOp`]s which the host view applies in order.

use std::fmt;

use crate::domain::{DepartmentId, ProductId};

/// A rendered markup fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Markup(String);

impl Markup {
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A product card ready to be inserted into the result container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardNode {
    pub id: ProductId,
    pub markup: Markup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomOp {
    /// Replace everything inside the result container
    ReplaceContainer(Vec<CardNode>),
    /// Replace the container content with a single message (loader, empty or error state)
    ShowMessage(Markup),
    /// Remove every node from the container
    ClearContainer,
    /// Append cards after the last card, before the sentinel
    AppendCards(Vec<CardNode>),
    /// Swap one card for a freshly rendered one, keeping its position
    ReplaceCard(CardNode),
    /// Collapse one card without removing it from the document
    HideCard(ProductId),
    /// Render the trailing sentinel and start observing it
    AttachSentinel { observer: u64 },
    /// Stop observing and remove the trailing sentinel
    DetachSentinel,
    ScrollToTop,
    UpdateListBadge { count: usize },
    UpdateDepartmentInfo {
        department: Option<DepartmentId>,
        count: usize,
    },
}

impl DomOp {
    /// Whether this op rebuilds the container rather than patching single nodes
    pub fn is_full_render(&self) -> bool {
        matches!(
            self,
            DomOp::ReplaceContainer(_) | DomOp::ShowMessage(_) | DomOp::ClearContainer
        )
    }

    /// Whether this op can move the sentinel relative to the viewport
    pub fn shifts_layout(&self) -> bool {
        matches!(
            self,
            DomOp::ReplaceContainer(_)
                | DomOp::AppendCards(_)
                | DomOp::HideCard(_)
                | DomOp::AttachSentinel { .. }
        )
    }
}

/// Sink for patch operations, implemented by whatever owns the document
pub trait View {
    fn apply(&mut self, op: &DomOp);

    fn apply_all(&mut self, ops: &[DomOp]) {
        for op in ops {
            self.apply(op);
        }
    }

    /// Observer id and visible share of the sentinel, if one is observed
    ///
    /// Views without a layout never report an intersection.
    fn sentinel_intersection(&self) -> Option<(u64, f64)> {
        None
    }
}
