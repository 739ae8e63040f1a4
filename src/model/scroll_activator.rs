//! Infinite scroll trigger
//!
//! Tracks the sentinel node rendered after the last card. The sentinel exists
//! only while the session reports more pages. Each full replacement of the
//! container reconnects the observer under a new id, so intersections
//! reported for a sentinel that no longer exists are recognised and dropped.

use crate::presentation::patch::DomOp;

pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Messages that can be sent to update the scroll activator
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The result container was fully re-rendered
    ContainerReplaced { has_more: bool },
    /// A continuation page was appended
    PageAppended { has_more: bool },
    /// The result container was emptied
    ContainerCleared,
    /// The host observer reported the sentinel entering the viewport
    SentinelIntersected {
        observer: u64,
        ratio: f64,
        is_loading: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Patch(Vec<DomOp>),
    LoadMore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollActivator {
    threshold: f64,
    observer: u64,
    attached: bool,
}

impl Default for ScrollActivator {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ScrollActivator {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            observer: 0,
            attached: false,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Id of the current observer, if a sentinel is attached
    pub fn observer(&self) -> Option<u64> {
        self.attached.then_some(self.observer)
    }

    pub fn update(&mut self, message: Message) -> Effect {
        match message {
            Message::ContainerReplaced { has_more } => {
                let mut ops = self.detach();
                if has_more {
                    ops.push(self.attach());
                }
                Self::patch(ops)
            }
            Message::PageAppended { has_more } => match (has_more, self.attached) {
                (true, false) => Effect::Patch(vec![self.attach()]),
                // The appended cards land before the sentinel; it stays put
                (true, true) => Effect::None,
                (false, _) => Self::patch(self.detach()),
            },
            Message::ContainerCleared => Self::patch(self.detach()),
            Message::SentinelIntersected {
                observer,
                ratio,
                is_loading,
            } => {
                if !self.attached || observer != self.observer {
                    log::debug!("Ignoring intersection of stale observer {observer}");
                    return Effect::None;
                }
                if ratio < self.threshold || is_loading {
                    return Effect::None;
                }
                Effect::LoadMore
            }
        }
    }

    fn attach(&mut self) -> DomOp {
        self.observer += 1;
        self.attached = true;
        DomOp::AttachSentinel {
            observer: self.observer,
        }
    }

    fn detach(&mut self) -> Vec<DomOp> {
        if !self.attached {
            return Vec::new();
        }
        self.attached = false;
        vec![DomOp::DetachSentinel]
    }

    fn patch(ops: Vec<DomOp>) -> Effect {
        if ops.is_empty() {
            Effect::None
        } else {
            Effect::Patch(ops)
        }
    }
}
