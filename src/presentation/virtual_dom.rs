//! In-memory result container
//!
//! Stands in for the browser document: it keeps the card nodes, the trailing
//! sentinel and a scroll offset, and applies [`DomOp`]s the same way the page
//! does. Layout is approximated with fixed row heights, which is enough to
//! check that a patch never moves the viewport.

use crate::domain::{DepartmentId, ProductId};

use super::{
    patch::{CardNode, DomOp, Markup, View},
    renderer,
};

const CARD_BASE_HEIGHT: u32 = 96;
const DETAIL_ROW_HEIGHT: u32 = 28;
const MESSAGE_HEIGHT: u32 = 160;
const SENTINEL_HEIGHT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    id: ProductId,
    markup: Markup,
    hidden: bool,
}

impl Node {
    fn height(&self) -> u32 {
        if self.hidden {
            return 0;
        }
        let rows = self.markup.as_str().matches("product-detail-row").count();
        CARD_BASE_HEIGHT + DETAIL_ROW_HEIGHT * u32::try_from(rows).unwrap_or(u32::MAX / 64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Content {
    #[default]
    Empty,
    Message(Markup),
    Cards(Vec<Node>),
}

/// Counters for asserting how a view was updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewStats {
    pub full_renders: usize,
    pub cards_replaced: usize,
    pub cards_hidden: usize,
    pub cards_appended: usize,
}

#[derive(Debug, Clone)]
pub struct VirtualDom {
    content: Content,
    sentinel: Option<u64>,
    scroll_top: u32,
    viewport_height: u32,
    list_badge: usize,
    department: Option<DepartmentId>,
    department_count: usize,
    stats: ViewStats,
}

impl Default for VirtualDom {
    fn default() -> Self {
        Self::new(720)
    }
}

impl VirtualDom {
    pub fn new(viewport_height: u32) -> Self {
        Self {
            content: Content::Empty,
            sentinel: None,
            scroll_top: 0,
            viewport_height,
            list_badge: 0,
            department: None,
            department_count: 0,
            stats: ViewStats::default(),
        }
    }

    pub fn stats(&self) -> ViewStats {
        self.stats
    }

    pub fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    pub fn scroll_to(&mut self, y: u32) {
        self.scroll_top = y;
        self.clamp_scroll();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_to(u32::MAX);
    }

    pub fn document_height(&self) -> u32 {
        let content = match &self.content {
            Content::Empty => 0,
            Content::Message(_) => MESSAGE_HEIGHT,
            Content::Cards(nodes) => nodes.iter().map(Node::height).sum(),
        };
        content + self.sentinel.map_or(0, |_| SENTINEL_HEIGHT)
    }

    /// Ids of the cards currently displayed, in document order
    pub fn visible_ids(&self) -> Vec<ProductId> {
        match &self.content {
            Content::Cards(nodes) => nodes
                .iter()
                .filter(|node| !node.hidden)
                .map(|node| node.id)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Ids of every card node still in the document, hidden ones included
    pub fn node_ids(&self) -> Vec<ProductId> {
        match &self.content {
            Content::Cards(nodes) => nodes.iter().map(|node| node.id).collect(),
            _ => Vec::new(),
        }
    }

    pub fn card(&self, id: ProductId) -> Option<&Markup> {
        self.find(id).map(|node| &node.markup)
    }

    pub fn is_hidden(&self, id: ProductId) -> Option<bool> {
        self.find(id).map(|node| node.hidden)
    }

    pub fn message(&self) -> Option<&Markup> {
        match &self.content {
            Content::Message(markup) => Some(markup),
            _ => None,
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.content == Content::Empty
    }

    pub fn sentinel(&self) -> Option<u64> {
        self.sentinel
    }

    pub fn list_badge(&self) -> usize {
        self.list_badge
    }

    pub fn department_info(&self) -> (Option<&DepartmentId>, usize) {
        (self.department.as_ref(), self.department_count)
    }

    /// Serialize the visible document
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str(renderer::render_department_info(self.department.as_ref(), self.department_count).as_str());
        html.push_str(renderer::render_list_badge(self.list_badge).as_str());
        html.push_str(r#"<div id="searchResults">"#);
        match &self.content {
            Content::Empty => {}
            Content::Message(markup) => html.push_str(markup.as_str()),
            Content::Cards(nodes) => {
                for node in nodes.iter().filter(|node| !node.hidden) {
                    html.push_str(node.markup.as_str());
                }
            }
        }
        if let Some(observer) = self.sentinel {
            html.push_str(renderer::render_sentinel(observer).as_str());
        }
        html.push_str("</div>");
        html
    }

    fn find(&self, id: ProductId) -> Option<&Node> {
        match &self.content {
            Content::Cards(nodes) => nodes.iter().find(|node| node.id == id),
            _ => None,
        }
    }

    fn find_mut(&mut self, id: ProductId) -> Option<&mut Node> {
        match &mut self.content {
            Content::Cards(nodes) => nodes.iter_mut().find(|node| node.id == id),
            _ => None,
        }
    }

    fn clamp_scroll(&mut self) {
        let max = self.document_height().saturating_sub(self.viewport_height);
        self.scroll_top = self.scroll_top.min(max);
    }

    fn nodes_from(cards: &[CardNode]) -> Vec<Node> {
        cards
            .iter()
            .map(|card| Node {
                id: card.id,
                markup: card.markup.clone(),
                hidden: false,
            })
            .collect()
    }
}

impl View for VirtualDom {
    fn apply(&mut self, op: &DomOp) {
        match op {
            DomOp::ReplaceContainer(cards) => {
                self.content = Content::Cards(Self::nodes_from(cards));
                self.stats.full_renders += 1;
            }
            DomOp::ShowMessage(markup) => {
                self.content = Content::Message(markup.clone());
                self.stats.full_renders += 1;
            }
            DomOp::ClearContainer => {
                self.content = Content::Empty;
                self.stats.full_renders += 1;
            }
            DomOp::AppendCards(cards) => {
                self.stats.cards_appended += cards.len();
                match &mut self.content {
                    Content::Cards(nodes) => nodes.extend(Self::nodes_from(cards)),
                    _ => self.content = Content::Cards(Self::nodes_from(cards)),
                }
            }
            DomOp::ReplaceCard(card) => match self.find_mut(card.id) {
                Some(node) => {
                    node.markup = card.markup.clone();
                    self.stats.cards_replaced += 1;
                }
                None => log::debug!("ReplaceCard ignored: no node for product {}", card.id),
            },
            DomOp::HideCard(id) => match self.find_mut(*id) {
                Some(node) => {
                    node.hidden = true;
                    self.stats.cards_hidden += 1;
                }
                None => log::debug!("HideCard ignored: no node for product {id}"),
            },
            DomOp::AttachSentinel { observer } => self.sentinel = Some(*observer),
            DomOp::DetachSentinel => self.sentinel = None,
            DomOp::ScrollToTop => self.scroll_top = 0,
            DomOp::UpdateListBadge { count } => self.list_badge = *count,
            DomOp::UpdateDepartmentInfo { department, count } => {
                self.department = department.clone();
                self.department_count = *count;
            }
        }
        self.clamp_scroll();
    }

    /// Share of the sentinel inside the viewport, as an intersection observer reports it
    fn sentinel_intersection(&self) -> Option<(u64, f64)> {
        let observer = self.sentinel?;
        let top = self.document_height().saturating_sub(SENTINEL_HEIGHT);
        let visible = top >= self.scroll_top && top < self.scroll_top + self.viewport_height;
        Some((observer, if visible { 1.0 } else { 0.0 }))
    }
}
