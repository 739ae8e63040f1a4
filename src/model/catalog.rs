//! Catalog screen model
//!
//! Parent component that coordinates the search session, the reconciler, the
//! scroll activator and the open reservation dialog.
//!
//! Design decisions:
//! - Messages are defined at the catalog level rather than wrapping child
//!   messages, so the page only ever speaks one vocabulary
//! - `update` is the single path for state changes and returns the side
//!   effects as a [`Cmd`]; patches are always applied before any spawned work
//!   reports back, so a new-query reset is visible before its fetch settles
//! - Records are mutated only after the server confirmed a change
//! - List snapshots are numbered when requested; an answer older than the
//!   last applied one, or requested before a clear, never reaches the locks

use crate::{
    core::{
        cmd::{Cmd, ConfirmAction, HapticKind},
        error::{FetchError, ReconcileError},
    },
    domain::{
        CheckoutResponse, DepartmentContext, ListMutation, ListStatus, MutationResponse, ProductId,
        ProductRecord, QuantityError, ReservationIntent, SearchPage, StepOutcome,
    },
    presentation::{patch::DomOp, renderer},
};

use super::{
    reconciler::Reconciler,
    result_cache::ResultCache,
    scroll_activator::{self, ScrollActivator},
    search_session::{self, FetchKind, FetchTicket, SearchSession, SessionSettings, Transition},
};

/// Messages that can be sent to update the catalog
///
/// Following Elm conventions, messages are named in past tense.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // Search
    /// The search input changed
    QueryChanged(String),
    /// A debounce timer fired
    DebounceElapsed { generation: u64 },
    /// The retry button or pull-to-refresh was used
    RefreshRequested,
    /// The next page was requested explicitly
    LoadMoreRequested,
    /// The scroll sentinel entered the viewport
    SentinelIntersected { observer: u64, ratio: f64 },
    /// A page fetch settled
    PageReceived {
        ticket: FetchTicket,
        result: Result<SearchPage, FetchError>,
    },

    // Reservation dialog
    /// A card was tapped
    CardOpened(ProductId),
    /// The quantity was moved by the +/- buttons
    QuantityStepped(i64),
    /// "All available" was chosen
    AllAvailableSelected,
    /// A quantity was typed in
    CustomQuantityEntered(String),
    ReservationCancelled,
    ReservationConfirmed,
    /// The reservation request settled
    ReservationSettled {
        intent: ReservationIntent,
        result: Result<MutationResponse, FetchError>,
    },

    // Temporary list
    /// Cart code changed the temporary list
    ListMutated(ListMutation),
    /// Fresh list and department snapshots arrived for request `sequence`
    ListStatusReceived {
        sequence: u64,
        result: Result<ListStatus, FetchError>,
    },
    /// A new quantity was chosen for an item of the list
    ItemQuantityChanged { product_id: ProductId, quantity: u32 },
    ItemUpdated(Result<MutationResponse, FetchError>),
    /// The delete button of a list item was used
    ItemRemovalRequested(ProductId),
    ItemDeleted(Result<MutationResponse, FetchError>),
    ClearListRequested,
    /// The user agreed in a host confirm dialog
    ActionConfirmed(ConfirmAction),
    ListCleared(Result<MutationResponse, FetchError>),
    CheckoutRequested,
    CheckoutSettled(Result<CheckoutResponse, FetchError>),
}

#[derive(Debug, Clone)]
pub struct Catalog {
    user_id: i64,
    session: SearchSession,
    reconciler: Reconciler,
    scroll: ScrollActivator,
    reservation: Option<ReservationIntent>,
    list_requested: u64,
    list_applied: u64,
}

impl Catalog {
    pub fn new(user_id: i64, settings: SessionSettings, threshold: f64) -> Self {
        Self {
            user_id,
            session: SearchSession::new(user_id, settings),
            reconciler: Reconciler::new(),
            scroll: ScrollActivator::new(threshold),
            reservation: None,
            list_requested: 0,
            list_applied: 0,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn results(&self) -> &ResultCache {
        self.reconciler.cache()
    }

    pub fn department_context(&self) -> &DepartmentContext {
        self.reconciler.context()
    }

    pub fn scroll(&self) -> &ScrollActivator {
        &self.scroll
    }

    pub fn reservation(&self) -> Option<&ReservationIntent> {
        self.reservation.as_ref()
    }

    /// Request fresh list and department snapshots
    pub fn refresh_list_status(&mut self) -> Cmd {
        self.list_requested += 1;
        Cmd::RefreshListStatus {
            sequence: self.list_requested,
        }
    }

    /// Drop every piece of state, as on a page reload
    ///
    /// Responses still in flight carry tickets of the old session and are
    /// dropped as stale.
    pub fn reset(&mut self) -> Cmd {
        self.session.restart();
        self.reconciler = Reconciler::new();
        let mut ops = vec![DomOp::ClearContainer];
        if let scroll_activator::Effect::Patch(detach) =
            self.scroll.update(scroll_activator::Message::ContainerCleared)
        {
            ops.extend(detach);
        }
        self.reservation = None;
        self.list_applied = self.list_requested;
        ops.push(DomOp::UpdateListBadge { count: 0 });
        ops.push(DomOp::UpdateDepartmentInfo {
            department: None,
            count: 0,
        });
        Cmd::batch(vec![Cmd::Patch(ops), self.refresh_list_status()])
    }

    /// Apply a confirmed reservation outside the dialog flow
    pub fn apply_reservation(
        &mut self,
        id: ProductId,
        quantity: u32,
        unit_price: f64,
    ) -> Result<Cmd, ReconcileError> {
        self.reconciler
            .reconcile_reservation(id, quantity, unit_price)
            .map(Cmd::patch)
    }

    /// Install a department context and patch only the cards whose lock flipped
    pub fn recompute_locks(&mut self, context: DepartmentContext) -> Cmd {
        Cmd::patch(self.reconciler.apply_department_context(context))
    }

    /// Update the catalog based on a message
    pub fn update(&mut self, message: Message) -> Cmd {
        match message {
            // Search
            Message::QueryChanged(query) => {
                let transition = self
                    .session
                    .update(search_session::Message::InputChanged(query));
                self.on_transition(transition)
            }
            Message::DebounceElapsed { generation } => {
                let transition = self
                    .session
                    .update(search_session::Message::DebounceElapsed { generation });
                self.on_transition(transition)
            }
            Message::RefreshRequested => {
                let transition = self.session.update(search_session::Message::RefreshRequested);
                self.on_transition(transition)
            }
            Message::LoadMoreRequested => {
                let transition = self.session.update(search_session::Message::MoreRequested);
                self.on_transition(transition)
            }
            Message::SentinelIntersected { observer, ratio } => {
                let effect = self
                    .scroll
                    .update(scroll_activator::Message::SentinelIntersected {
                        observer,
                        ratio,
                        is_loading: self.session.is_loading(),
                    });
                match effect {
                    scroll_activator::Effect::LoadMore => self.update(Message::LoadMoreRequested),
                    scroll_activator::Effect::Patch(ops) => Cmd::patch(ops),
                    scroll_activator::Effect::None => Cmd::None,
                }
            }
            Message::PageReceived { ticket, result } => self.on_page(ticket, result),

            // Reservation dialog
            Message::CardOpened(id) => self.open_card(id),
            Message::QuantityStepped(delta) => match self.reservation.as_mut() {
                Some(intent) => match intent.step(delta) {
                    StepOutcome::Changed => Cmd::Haptic(HapticKind::Light),
                    StepOutcome::Clamped => Cmd::Haptic(HapticKind::Warning),
                },
                None => Cmd::None,
            },
            Message::AllAvailableSelected => match self.reservation.as_mut() {
                Some(intent) => {
                    intent.select_all();
                    Cmd::Haptic(HapticKind::Medium)
                }
                None => Cmd::None,
            },
            Message::CustomQuantityEntered(input) => match self.reservation.as_mut() {
                Some(intent) => match intent.set_custom(&input) {
                    Ok(_) => Cmd::None,
                    Err(error) => Cmd::batch(vec![
                        Cmd::Alert(renderer::quantity_error_notice(&error)),
                        Cmd::Haptic(HapticKind::Error),
                    ]),
                },
                None => Cmd::None,
            },
            Message::ReservationCancelled => {
                self.reservation = None;
                Cmd::None
            }
            Message::ReservationConfirmed => {
                let Some(intent) = self.reservation.take() else {
                    return Cmd::None;
                };
                if let Err(error) = intent.validate() {
                    let notice = renderer::quantity_error_notice(&error);
                    self.reservation = Some(intent);
                    return Cmd::batch(vec![Cmd::Alert(notice), Cmd::Haptic(HapticKind::Error)]);
                }
                log::info!(
                    "Reserving {} x {} (product {})",
                    intent.quantity(),
                    intent.article(),
                    intent.product_id()
                );
                Cmd::Reserve { intent }
            }
            Message::ReservationSettled { intent, result } => self.on_reservation(intent, result),

            // Temporary list
            Message::ListMutated(mutation) => {
                log::debug!("Temporary list mutated: {mutation:?}");
                self.refresh_list_status()
            }
            Message::ListStatusReceived { sequence, result } => {
                self.on_list_status(sequence, result)
            }
            Message::ItemQuantityChanged {
                product_id,
                quantity,
            } => {
                if quantity == 0 {
                    return Cmd::batch(vec![
                        Cmd::Alert(renderer::quantity_error_notice(&QuantityError::BelowMinimum)),
                        Cmd::Haptic(HapticKind::Error),
                    ]);
                }
                Cmd::UpdateItem {
                    product_id,
                    quantity,
                }
            }
            Message::ItemUpdated(result) => self.on_list_change(result, ListMutation::ItemUpdated),
            Message::ItemRemovalRequested(product_id) => Cmd::Confirm {
                prompt: renderer::DELETE_ITEM_PROMPT.to_owned(),
                action: ConfirmAction::DeleteItem(product_id),
            },
            Message::ItemDeleted(result) => self.on_list_change(result, ListMutation::ItemDeleted),
            Message::ClearListRequested => Cmd::Confirm {
                prompt: renderer::CLEAR_LIST_PROMPT.to_owned(),
                action: ConfirmAction::ClearList,
            },
            Message::ActionConfirmed(ConfirmAction::ClearList) => Cmd::ClearList,
            Message::ActionConfirmed(ConfirmAction::DeleteItem(product_id)) => {
                Cmd::DeleteItem { product_id }
            }
            Message::ListCleared(Ok(response)) if response.success => Cmd::batch(vec![
                self.clear_department(),
                Cmd::Haptic(HapticKind::Success),
                Cmd::Alert(renderer::success_notice(&response.message)),
                self.update(Message::ListMutated(ListMutation::Cleared)),
            ]),
            Message::ListCleared(Ok(response)) => self.failure(&response.message),
            Message::ListCleared(Err(error)) => self.failure(error.user_message()),
            Message::CheckoutRequested => Cmd::Checkout,
            Message::CheckoutSettled(Ok(response)) if response.success => {
                let cleared = if response.cleared {
                    self.clear_department()
                } else {
                    Cmd::None
                };
                Cmd::batch(vec![
                    cleared,
                    Cmd::Haptic(HapticKind::Success),
                    Cmd::Alert(renderer::CHECKOUT_DONE_NOTICE.to_owned()),
                    self.update(Message::ListMutated(ListMutation::CheckedOut)),
                ])
            }
            Message::CheckoutSettled(Ok(response)) => self.failure(&response.message),
            Message::CheckoutSettled(Err(error)) => self.failure(error.user_message()),
        }
    }

    fn on_transition(&mut self, transition: Transition) -> Cmd {
        match transition {
            Transition::Ignored | Transition::Stale => Cmd::None,
            Transition::DebounceScheduled { generation, delay } => {
                Cmd::ScheduleDebounce { generation, delay }
            }
            Transition::Cleared => {
                self.reconciler.clear_results();
                let mut ops = vec![DomOp::ClearContainer];
                ops.extend(self.scroll_ops(scroll_activator::Message::ContainerCleared));
                Cmd::Patch(ops)
            }
            Transition::FetchStarted { ticket, request } => {
                log::debug!(
                    "Fetching {:?} at offset {} ({:?})",
                    request.query,
                    request.offset,
                    ticket.kind()
                );
                if ticket.kind() == FetchKind::Continuation {
                    return Cmd::FetchPage { ticket, request };
                }
                self.reconciler.clear_results();
                let mut ops = vec![
                    DomOp::ShowMessage(renderer::render_loader()),
                    DomOp::ScrollToTop,
                ];
                ops.extend(self.scroll_ops(scroll_activator::Message::ContainerCleared));
                Cmd::batch(vec![Cmd::Patch(ops), Cmd::FetchPage { ticket, request }])
            }
            // Settlements are handled in `on_page`
            Transition::PageAccepted { .. } | Transition::PageRejected { .. } => Cmd::None,
        }
    }

    fn on_page(&mut self, ticket: FetchTicket, result: Result<SearchPage, FetchError>) -> Cmd {
        match result {
            Ok(page) => {
                let transition = self.session.update(search_session::Message::PageLoaded {
                    ticket,
                    received: page.len(),
                    has_more: page.has_more,
                });
                let Transition::PageAccepted { kind } = transition else {
                    return Cmd::None;
                };
                let has_more = self.session.has_more();
                let mut ops = match kind {
                    FetchKind::NewSearch => self.reconciler.replace_results(page.products),
                    FetchKind::Continuation => self.reconciler.append_results(page.products),
                };
                let scroll = if ops.iter().any(DomOp::is_full_render) {
                    scroll_activator::Message::ContainerReplaced { has_more }
                } else {
                    scroll_activator::Message::PageAppended { has_more }
                };
                ops.extend(self.scroll_ops(scroll));
                Cmd::patch(ops)
            }
            Err(error) => {
                let transition = self
                    .session
                    .update(search_session::Message::PageFailed { ticket });
                match transition {
                    Transition::PageRejected {
                        kind: FetchKind::NewSearch,
                    } => {
                        log::warn!("Search failed: {error}");
                        let mut ops = vec![DomOp::ShowMessage(renderer::render_error_state())];
                        ops.extend(self.scroll_ops(scroll_activator::Message::ContainerCleared));
                        Cmd::batch(vec![Cmd::Patch(ops), Cmd::Haptic(HapticKind::Error)])
                    }
                    Transition::PageRejected {
                        kind: FetchKind::Continuation,
                    } => {
                        log::warn!("Loading the next page failed: {error}");
                        Cmd::batch(vec![
                            Cmd::Alert(renderer::load_more_failed_notice()),
                            Cmd::Haptic(HapticKind::Error),
                        ])
                    }
                    _ => Cmd::None,
                }
            }
        }
    }

    fn open_card(&mut self, id: ProductId) -> Cmd {
        let Some(record) = self.reconciler.cache().get(id) else {
            log::debug!("Ignoring tap on unknown product {id}");
            return Cmd::None;
        };
        if record.is_locked() {
            return self.explain_lock(record);
        }
        match ReservationIntent::open(record) {
            Ok(intent) => {
                self.reservation = Some(intent);
                Cmd::Haptic(HapticKind::Light)
            }
            Err(error) => Cmd::batch(vec![
                Cmd::Alert(renderer::quantity_error_notice(&error)),
                Cmd::Haptic(HapticKind::Warning),
            ]),
        }
    }

    fn explain_lock(&self, record: &ProductRecord) -> Cmd {
        // Read at tap time: the card markup does not carry the department
        let department = self
            .reconciler
            .context()
            .department()
            .or(record.locked_by_department.as_ref());
        match department {
            Some(department) => Cmd::batch(vec![
                Cmd::Haptic(HapticKind::Warning),
                Cmd::Alert(renderer::locked_alert_text(department)),
            ]),
            None => Cmd::None,
        }
    }

    fn on_reservation(
        &mut self,
        intent: ReservationIntent,
        result: Result<MutationResponse, FetchError>,
    ) -> Cmd {
        let response = match result {
            Ok(response) if response.success => response,
            Ok(response) => return self.failure(&response.message),
            Err(error) => return self.failure(error.user_message()),
        };

        let patch = match self.reconciler.reconcile_reservation(
            intent.product_id(),
            intent.quantity(),
            intent.unit_price(),
        ) {
            Ok(ops) => Cmd::patch(ops),
            Err(error) => {
                // The results were replaced while the request was in flight
                log::debug!("Reservation confirmed for a product no longer shown: {error}");
                Cmd::None
            }
        };

        Cmd::batch(vec![
            patch,
            Cmd::Haptic(HapticKind::Success),
            Cmd::Alert(renderer::success_notice(&response.message)),
            self.update(Message::ListMutated(ListMutation::Reserved)),
        ])
    }

    fn on_list_status(&mut self, sequence: u64, result: Result<ListStatus, FetchError>) -> Cmd {
        let status = match result {
            Ok(status) => status,
            Err(error) => {
                log::warn!("Failed to refresh the temporary list: {error}");
                return Cmd::None;
            }
        };
        if sequence <= self.list_applied {
            log::debug!(
                "Dropping list snapshot {sequence}, already at {}",
                self.list_applied
            );
            return Cmd::None;
        }
        self.list_applied = sequence;
        let mut ops = self.reconciler.apply_department_context(status.context());
        ops.push(DomOp::UpdateListBadge {
            count: status.item_count(),
        });
        Cmd::patch(ops)
    }

    /// Settle an item update or deletion made from the list screen
    fn on_list_change(
        &mut self,
        result: Result<MutationResponse, FetchError>,
        mutation: ListMutation,
    ) -> Cmd {
        match result {
            Ok(response) if response.success => Cmd::batch(vec![
                Cmd::Haptic(HapticKind::Success),
                Cmd::Alert(renderer::success_notice(&response.message)),
                self.update(Message::ListMutated(mutation)),
            ]),
            Ok(response) => self.failure(&response.message),
            Err(error) => self.failure(error.user_message()),
        }
    }

    fn clear_department(&mut self) -> Cmd {
        // Snapshots requested before the list was emptied are outdated
        self.list_applied = self.list_requested;
        let mut ops = self
            .reconciler
            .apply_department_context(DepartmentContext::cleared());
        ops.push(DomOp::UpdateListBadge { count: 0 });
        Cmd::patch(ops)
    }

    fn failure(&self, message: &str) -> Cmd {
        log::warn!("Temporary list operation failed: {message}");
        Cmd::batch(vec![
            Cmd::Haptic(HapticKind::Error),
            Cmd::Alert(renderer::failure_notice(message)),
        ])
    }

    fn scroll_ops(&mut self, message: scroll_activator::Message) -> Vec<DomOp> {
        match self.scroll.update(message) {
            scroll_activator::Effect::Patch(ops) => ops,
            scroll_activator::Effect::None | scroll_activator::Effect::LoadMore => Vec::new(),
        }
    }
}
