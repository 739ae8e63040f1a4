use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use futures::future::try_join;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    core::cmd::Cmd,
    domain::ListStatus,
    infrastructure::{catalog_client::CatalogApi, host::HostCapabilities},
    model::catalog::Message,
    presentation::patch::View,
};

/// Command executor that bridges catalog commands to the view, the host and the backend
///
/// Patches, alerts and haptics run synchronously, in command order. Remote
/// calls, timers and confirmations are spawned onto the tokio runtime and
/// report back through the message channel.
#[derive(Clone)]
pub struct CmdExecutor {
    api: Arc<dyn CatalogApi>,
    host: Arc<dyn HostCapabilities>,
    user_id: i64,
    msg_sender: mpsc::UnboundedSender<Message>,
    cancel: CancellationToken,
    in_flight: Arc<AtomicUsize>,
    settled: Arc<Notify>,
}

impl CmdExecutor {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        host: Arc<dyn HostCapabilities>,
        user_id: i64,
        msg_sender: mpsc::UnboundedSender<Message>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            host,
            user_id,
            msg_sender,
            cancel,
            in_flight: Arc::new(AtomicUsize::new(0)),
            settled: Arc::new(Notify::new()),
        }
    }

    /// Number of spawned tasks that have not reported back yet
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Signalled each time a spawned task finishes
    pub fn settled(&self) -> Arc<Notify> {
        Arc::clone(&self.settled)
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Execute a command, applying its patches to `view`
    pub fn execute<V: View + ?Sized>(&self, cmd: Cmd, view: &mut V) {
        for cmd in cmd.flatten() {
            self.execute_command(cmd, view);
        }
    }

    fn execute_command<V: View + ?Sized>(&self, cmd: Cmd, view: &mut V) {
        match cmd {
            Cmd::None | Cmd::Batch(_) => {
                // Batches were flattened by `execute`
            }

            // Synchronous effects
            Cmd::Patch(ops) => view.apply_all(&ops),
            Cmd::Alert(message) => self.host.alert(&message),
            Cmd::Haptic(kind) => self.host.haptic(kind),

            // Timers
            Cmd::ScheduleDebounce { generation, delay } => {
                self.spawn("debounce", async move {
                    tokio::time::sleep(delay).await;
                    Some(Message::DebounceElapsed { generation })
                });
            }

            // Backend
            Cmd::FetchPage { ticket, request } => {
                let api = Arc::clone(&self.api);
                self.spawn("fetch_page", async move {
                    let result = api.search(&request).await;
                    if let Err(e) = &result {
                        log::warn!("Search request for {:?} failed: {e}", request.query);
                    }
                    Some(Message::PageReceived { ticket, result })
                });
            }
            Cmd::Reserve { intent } => {
                let api = Arc::clone(&self.api);
                let user_id = self.user_id;
                self.spawn("reserve", async move {
                    let result = api
                        .reserve(user_id, intent.product_id(), intent.quantity())
                        .await;
                    Some(Message::ReservationSettled { intent, result })
                });
            }
            Cmd::UpdateItem {
                product_id,
                quantity,
            } => {
                let api = Arc::clone(&self.api);
                let user_id = self.user_id;
                self.spawn("update_item", async move {
                    let result = api.update_item(user_id, product_id, quantity).await;
                    Some(Message::ItemUpdated(result))
                });
            }
            Cmd::DeleteItem { product_id } => {
                let api = Arc::clone(&self.api);
                let user_id = self.user_id;
                self.spawn("delete_item", async move {
                    Some(Message::ItemDeleted(api.delete_item(user_id, product_id).await))
                });
            }
            Cmd::RefreshListStatus { sequence } => {
                let api = Arc::clone(&self.api);
                let user_id = self.user_id;
                self.spawn("refresh_list_status", async move {
                    let result = try_join(api.list_snapshot(user_id), api.department(user_id))
                        .await
                        .map(|(list, department)| ListStatus { list, department });
                    Some(Message::ListStatusReceived { sequence, result })
                });
            }
            Cmd::ClearList => {
                let api = Arc::clone(&self.api);
                let user_id = self.user_id;
                self.spawn("clear_list", async move {
                    Some(Message::ListCleared(api.clear_list(user_id).await))
                });
            }
            Cmd::Checkout => {
                let api = Arc::clone(&self.api);
                let user_id = self.user_id;
                self.spawn("checkout", async move {
                    Some(Message::CheckoutSettled(api.checkout(user_id).await))
                });
            }

            // Host dialogs
            Cmd::Confirm { prompt, action } => {
                let host = Arc::clone(&self.host);
                self.spawn("confirm", async move {
                    if host.confirm(&prompt).await {
                        Some(Message::ActionConfirmed(action))
                    } else {
                        log::debug!("Confirmation declined: {prompt}");
                        None
                    }
                });
            }
        }
    }

    fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Option<Message>> + Send + 'static,
    {
        let sender = self.msg_sender.clone();
        let cancel = self.cancel.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let settled = Arc::clone(&self.settled);
        in_flight.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        log::debug!("Task {name} cancelled");
                    }
                    message = task => {
                        if let Some(message) = message {
                            if sender.send(message).is_err() {
                                log::debug!("Task {name} finished after the runtime stopped");
                            }
                        }
                    }
                }
                // Decrement only after the message is queued, so an idle check
                // never misses it
                in_flight.fetch_sub(1, Ordering::SeqCst);
                settled.notify_one();
            }
            .instrument(tracing::debug_span!("cmd", name)),
        );
    }
}
