//! Search session state
//!
//! Owns the committed query, the paging cursor and the in-flight guard.
//! It decides whether a dispatch starts a new search or continues the current
//! one, but knows nothing about records or rendering: the catalog turns every
//! [`Transition`] into cache and view changes.

use std::time::Duration;

use crate::domain::SearchRequest;

/// Identity of one outstanding page fetch
///
/// A response is only accepted when it carries the ticket the session is
/// waiting for. Any other response belongs to a superseded query or an
/// earlier fetch and is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    query: String,
    sequence: u64,
    kind: FetchKind,
}

impl FetchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn kind(&self) -> FetchKind {
        self.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First page of a query, replaces whatever is rendered
    NewSearch,
    /// Next page of the current query, appended after the rendered cards
    Continuation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub debounce: Duration,
    pub min_query_len: usize,
    pub page_size: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            min_query_len: 2,
            page_size: 50,
        }
    }
}

/// Messages that can be sent to update the search session
///
/// Following Elm conventions, messages are named in past tense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// The search input changed
    InputChanged(String),
    /// A debounce timer fired
    DebounceElapsed { generation: u64 },
    /// The current query should be searched again from the first page
    RefreshRequested,
    /// The next page was requested
    MoreRequested,
    /// A page fetch succeeded with `received` records
    PageLoaded {
        ticket: FetchTicket,
        received: usize,
        has_more: bool,
    },
    /// A page fetch failed
    PageFailed { ticket: FetchTicket },
}

/// What the session decided in response to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to do
    Ignored,
    /// Start a quiescence timer for this generation
    DebounceScheduled { generation: u64, delay: Duration },
    /// The query became too short; rendered output must be cleared
    Cleared,
    /// A page fetch must be issued
    FetchStarted {
        ticket: FetchTicket,
        request: SearchRequest,
    },
    /// The outstanding fetch settled successfully
    PageAccepted { kind: FetchKind },
    /// The outstanding fetch failed
    PageRejected { kind: FetchKind },
    /// A response for a superseded fetch arrived and was dropped
    Stale,
}

#[derive(Debug, Clone)]
pub struct SearchSession {
    user_id: i64,
    settings: SessionSettings,
    input: String,
    generation: u64,
    query: String,
    offset: usize,
    has_more: bool,
    sequence: u64,
    in_flight: Option<FetchTicket>,
}

impl SearchSession {
    pub fn new(user_id: i64, settings: SessionSettings) -> Self {
        Self {
            user_id,
            settings,
            input: String::new(),
            generation: 0,
            query: String::new(),
            offset: 0,
            has_more: false,
            sequence: 0,
            in_flight: None,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// The query of the rendered results
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    /// Update the session based on a message
    pub fn update(&mut self, message: Message) -> Transition {
        match message {
            Message::InputChanged(raw) => {
                let input = raw.trim();
                // Any keystroke invalidates the pending timer
                self.generation += 1;
                if input.chars().count() < self.settings.min_query_len {
                    self.input.clear();
                    self.reset_cursor(String::new());
                    return Transition::Cleared;
                }
                self.input = input.to_owned();
                Transition::DebounceScheduled {
                    generation: self.generation,
                    delay: self.settings.debounce,
                }
            }
            Message::DebounceElapsed { generation } => {
                if generation != self.generation {
                    log::debug!("Debounce timer {generation} superseded by {}", self.generation);
                    return Transition::Ignored;
                }
                // Nothing loaded yet for this query, e.g. after a failed search
                let unloaded = self.offset == 0 && !self.is_loading();
                if self.input != self.query || unloaded {
                    let query = self.input.clone();
                    return self.start_new_search(query);
                }
                self.start_continuation()
            }
            Message::RefreshRequested => {
                if self.query.is_empty() {
                    return Transition::Ignored;
                }
                let query = self.query.clone();
                self.start_new_search(query)
            }
            Message::MoreRequested => self.start_continuation(),
            Message::PageLoaded {
                ticket,
                received,
                has_more,
            } => {
                if self.in_flight.as_ref() != Some(&ticket) {
                    log::debug!(
                        "Dropping stale page for {:?} (sequence {})",
                        ticket.query,
                        ticket.sequence
                    );
                    return Transition::Stale;
                }
                self.in_flight = None;
                self.offset += received;
                self.has_more = has_more;
                Transition::PageAccepted { kind: ticket.kind }
            }
            Message::PageFailed { ticket } => {
                if self.in_flight.as_ref() != Some(&ticket) {
                    log::debug!("Dropping stale failure for {:?}", ticket.query);
                    return Transition::Stale;
                }
                self.in_flight = None;
                Transition::PageRejected { kind: ticket.kind }
            }
        }
    }

    /// Forget the query and every outstanding fetch or timer
    ///
    /// Counters keep increasing, so nothing issued before the restart can
    /// match afterwards.
    pub fn restart(&mut self) {
        self.generation += 1;
        self.input.clear();
        self.reset_cursor(String::new());
    }

    fn reset_cursor(&mut self, query: String) {
        self.query = query;
        self.offset = 0;
        self.has_more = false;
        // Responses for the previous query can no longer match
        self.sequence += 1;
        self.in_flight = None;
    }

    fn start_new_search(&mut self, query: String) -> Transition {
        self.reset_cursor(query);
        self.issue(FetchKind::NewSearch)
    }

    fn start_continuation(&mut self) -> Transition {
        if self.is_loading() || !self.has_more {
            return Transition::Ignored;
        }
        self.issue(FetchKind::Continuation)
    }

    fn issue(&mut self, kind: FetchKind) -> Transition {
        self.sequence += 1;
        let ticket = FetchTicket {
            query: self.query.clone(),
            sequence: self.sequence,
            kind,
        };
        let request = SearchRequest {
            query: self.query.clone(),
            user_id: self.user_id,
            offset: self.offset,
            limit: self.settings.page_size,
        };
        self.in_flight = Some(ticket.clone());
        Transition::FetchStarted { ticket, request }
    }
}
