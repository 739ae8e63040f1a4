use std::time::Duration;

use strum::{Display, EnumString};

use crate::{
    domain::{ProductId, ReservationIntent, SearchRequest},
    model::search_session::FetchTicket,
    presentation::patch::DomOp,
};

/// Haptic feedback styles offered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum HapticKind {
    Success,
    Warning,
    Error,
    Light,
    Medium,
    Heavy,
}

/// Actions that run only after the user agreed in a host confirm dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    ClearList,
    DeleteItem(ProductId),
}

/// Elm-like command definitions
///
/// Commands describe side effects. Patches, alerts and haptics are applied
/// synchronously by the executor; remote calls and timers are spawned and
/// report back as messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    // Search
    ScheduleDebounce {
        generation: u64,
        delay: Duration,
    },
    FetchPage {
        ticket: FetchTicket,
        request: SearchRequest,
    },

    // Temporary list
    Reserve {
        intent: ReservationIntent,
    },
    UpdateItem {
        product_id: ProductId,
        quantity: u32,
    },
    DeleteItem {
        product_id: ProductId,
    },
    /// Fetch list and department snapshots; `sequence` orders the answers
    RefreshListStatus {
        sequence: u64,
    },
    ClearList,
    Checkout,

    // Host
    Confirm {
        prompt: String,
        action: ConfirmAction,
    },
    Alert(String),
    Haptic(HapticKind),

    // View
    Patch(Vec<DomOp>),

    // Batch command (execute multiple commands together, in order)
    Batch(Vec<Cmd>),

    None,
}

impl Cmd {
    /// Combine multiple commands into one, dropping `Cmd::None`
    pub fn batch(commands: Vec<Cmd>) -> Cmd {
        let mut commands: Vec<Cmd> = commands
            .into_iter()
            .filter(|cmd| *cmd != Cmd::None)
            .collect();
        match commands.len() {
            0 => Cmd::None,
            1 => commands.pop().unwrap_or(Cmd::None),
            _ => Cmd::Batch(commands),
        }
    }

    /// A patch command, or `Cmd::None` when there is nothing to apply
    pub fn patch(ops: Vec<DomOp>) -> Cmd {
        if ops.is_empty() {
            Cmd::None
        } else {
            Cmd::Patch(ops)
        }
    }

    /// Whether the command requires asynchronous processing
    pub fn is_async(&self) -> bool {
        match self {
            Cmd::ScheduleDebounce { .. }
            | Cmd::FetchPage { .. }
            | Cmd::Reserve { .. }
            | Cmd::UpdateItem { .. }
            | Cmd::DeleteItem { .. }
            | Cmd::RefreshListStatus { .. }
            | Cmd::ClearList
            | Cmd::Checkout
            | Cmd::Confirm { .. } => true,

            Cmd::Alert(_) | Cmd::Haptic(_) | Cmd::Patch(_) | Cmd::None => false,

            Cmd::Batch(cmds) => cmds.iter().any(Cmd::is_async),
        }
    }

    /// Flatten nested batches into execution order
    pub fn flatten(self) -> Vec<Cmd> {
        match self {
            Cmd::Batch(cmds) => cmds.into_iter().flat_map(Cmd::flatten).collect(),
            Cmd::None => Vec::new(),
            cmd => vec![cmd],
        }
    }

    /// Every patch operation contained in the command, in order
    pub fn patches(&self) -> Vec<&DomOp> {
        match self {
            Cmd::Patch(ops) => ops.iter().collect(),
            Cmd::Batch(cmds) => cmds.iter().flat_map(Cmd::patches).collect(),
            _ => Vec::new(),
        }
    }
}
