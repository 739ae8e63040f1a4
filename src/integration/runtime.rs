use std::{fmt, sync::Arc};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{cmd::Cmd, error::ReconcileError},
    domain::{DepartmentContext, ListMutation, ProductId},
    infrastructure::{catalog_client::CatalogApi, host::HostCapabilities},
    model::catalog::{Catalog, Message},
    presentation::{
        patch::{DomOp, View},
        virtual_dom::VirtualDom,
    },
};

use super::cmd_executor::CmdExecutor;

/// Counters describing what the update loop has done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub dispatched: usize,
    pub commands: usize,
}

/// Single-threaded update loop around a [`Catalog`]
///
/// Every message is applied by [`dispatch`](Self::dispatch): the catalog
/// update, then every synchronous effect of the resulting command, before
/// the next message is looked at. Spawned work reports back through the
/// message channel and is dispatched the same way.
///
/// Like an intersection observer, the view is asked about the sentinel after
/// every patch that can move it, so a page too short to scroll still loads
/// its continuation.
pub struct Runtime<V: View> {
    catalog: Catalog,
    view: V,
    executor: CmdExecutor,
    msg_rx: mpsc::UnboundedReceiver<Message>,
    stats: RuntimeStats,
}

impl<V: View> Runtime<V> {
    pub fn new(
        catalog: Catalog,
        view: V,
        api: Arc<dyn CatalogApi>,
        host: Arc<dyn HostCapabilities>,
        cancel: CancellationToken,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let executor = CmdExecutor::new(api, host, catalog.user_id(), msg_tx, cancel);
        Self {
            catalog,
            view,
            executor,
            msg_rx,
            stats: RuntimeStats::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// Whether no spawned work is outstanding and no message is queued
    pub fn is_idle(&self) -> bool {
        self.executor.in_flight() == 0 && self.msg_rx.is_empty()
    }

    /// Load the temporary list so that locks apply from the first page on
    pub fn start(&mut self) {
        let cmd = self.catalog.refresh_list_status();
        self.execute(cmd);
    }

    /// Apply one message and its synchronous effects
    pub fn dispatch(&mut self, message: Message) {
        let span = tracing::debug_span!("dispatch", message = ?MessageKind(&message));
        let _enter = span.enter();
        self.stats.dispatched += 1;
        let cmd = self.catalog.update(message);
        self.execute(cmd);
    }

    fn execute(&mut self, cmd: Cmd) {
        if cmd != Cmd::None {
            self.stats.commands += 1;
        }
        let relayout = cmd.patches().into_iter().any(DomOp::shifts_layout);
        self.executor.execute(cmd, &mut self.view);
        if relayout {
            self.observe_sentinel();
        }
    }

    fn observe_sentinel(&mut self) {
        if let Some((observer, ratio)) = self.view.sentinel_intersection() {
            if ratio > 0.0 {
                self.dispatch(Message::SentinelIntersected { observer, ratio });
            }
        }
    }

    /// Wait for the next message reported by spawned work
    pub async fn recv(&mut self) -> Option<Message> {
        self.msg_rx.recv().await
    }

    /// Wait for and dispatch the next reported message
    ///
    /// Returns `false` once the channel is closed.
    pub async fn next(&mut self) -> bool {
        match self.recv().await {
            Some(message) => {
                self.dispatch(message);
                true
            }
            None => false,
        }
    }

    /// Dispatch reported messages until no work is outstanding
    pub async fn run_until_idle(&mut self) {
        let settled = self.executor.settled();
        while !self.is_idle() {
            tokio::select! {
                message = self.msg_rx.recv() => match message {
                    Some(message) => self.dispatch(message),
                    None => break,
                },
                // A task may finish without reporting anything
                () = settled.notified() => {}
            }
        }
    }

    // Operations exposed to the page

    pub fn submit_query(&mut self, query: impl Into<String>) {
        self.dispatch(Message::QueryChanged(query.into()));
    }

    pub fn load_more(&mut self) {
        self.dispatch(Message::LoadMoreRequested);
    }

    pub fn refresh(&mut self) {
        self.dispatch(Message::RefreshRequested);
    }

    /// Apply a reservation the server already confirmed
    pub fn apply_reservation(
        &mut self,
        id: ProductId,
        quantity: u32,
        unit_price: f64,
    ) -> Result<(), ReconcileError> {
        let cmd = self.catalog.apply_reservation(id, quantity, unit_price)?;
        self.execute(cmd);
        Ok(())
    }

    pub fn recompute_locks(&mut self, context: DepartmentContext) {
        let cmd = self.catalog.recompute_locks(context);
        self.execute(cmd);
    }

    /// Render hook for cart code that changed the temporary list
    pub fn list_mutated(&mut self, mutation: ListMutation) {
        self.dispatch(Message::ListMutated(mutation));
    }

    pub fn update_item(&mut self, product_id: ProductId, quantity: u32) {
        self.dispatch(Message::ItemQuantityChanged {
            product_id,
            quantity,
        });
    }

    /// Ask the host to confirm, then delete the item
    pub fn delete_item(&mut self, product_id: ProductId) {
        self.dispatch(Message::ItemRemovalRequested(product_id));
    }

    /// Drop all state as on a page reload
    pub fn reset(&mut self) {
        let cmd = self.catalog.reset();
        self.execute(cmd);
    }
}

impl Runtime<VirtualDom> {
    /// Scroll the simulated viewport and report the sentinel like an observer would
    pub fn scroll_to(&mut self, y: u32) {
        self.view.scroll_to(y);
        self.observe_sentinel();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.view.scroll_to_bottom();
        self.observe_sentinel();
    }

    /// Scroll to a share of the document height, `0.0` being the top
    pub fn scroll_ratio(&mut self, ratio: f64) {
        let height = f64::from(self.view.document_height());
        let y = (height * ratio.clamp(0.0, 1.0)).round();
        self.scroll_to(y as u32);
    }
}

/// Message name without its payload, for log spans
struct MessageKind<'a>(&'a Message);

impl fmt::Debug for MessageKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            Message::QueryChanged(_) => "QueryChanged",
            Message::DebounceElapsed { .. } => "DebounceElapsed",
            Message::RefreshRequested => "RefreshRequested",
            Message::LoadMoreRequested => "LoadMoreRequested",
            Message::SentinelIntersected { .. } => "SentinelIntersected",
            Message::PageReceived { .. } => "PageReceived",
            Message::CardOpened(_) => "CardOpened",
            Message::QuantityStepped(_) => "QuantityStepped",
            Message::AllAvailableSelected => "AllAvailableSelected",
            Message::CustomQuantityEntered(_) => "CustomQuantityEntered",
            Message::ReservationCancelled => "ReservationCancelled",
            Message::ReservationConfirmed => "ReservationConfirmed",
            Message::ReservationSettled { .. } => "ReservationSettled",
            Message::ListMutated(_) => "ListMutated",
            Message::ListStatusReceived { .. } => "ListStatusReceived",
            Message::ItemQuantityChanged { .. } => "ItemQuantityChanged",
            Message::ItemUpdated(_) => "ItemUpdated",
            Message::ItemRemovalRequested(_) => "ItemRemovalRequested",
            Message::ItemDeleted(_) => "ItemDeleted",
            Message::ClearListRequested => "ClearListRequested",
            Message::ActionConfirmed(_) => "ActionConfirmed",
            Message::ListCleared(_) => "ListCleared",
            Message::CheckoutRequested => "CheckoutRequested",
            Message::CheckoutSettled(_) => "CheckoutSettled",
        };
        f.write_str(name)
    }
}
