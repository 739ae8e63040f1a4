//! # Epicsearch - catalog search client
//!
//! Client-side core of the inventory Mini App: debounced, paginated product
//! search with infinite scroll, reservation into a personal temporary list,
//! and in-place reconciliation of the rendered result cards.
//!
//! ## Architecture Overview
//!
//! This crate is organized around the Elm architecture pattern:
//!
//! - **Model** (`model`): the catalog screen state and its children
//! - **Message** (`model::catalog::Message`): events that can change the state
//! - **Update** (`Catalog::update`): applies a message and returns side effects
//! - **Command** (`core::cmd`): side effects (network, timers, host dialogs, DOM patches)
//! - **View** (`presentation`): pure renderers and the DOM patch protocol
//!
//! ## Example Usage
//!
//! ```rust
//! use epicsearch::{
//!     core::cmd::Cmd,
//!     model::{catalog::{Catalog, Message}, search_session::SessionSettings},
//! };
//!
//! let mut catalog = Catalog::new(7, SessionSettings::default(), 0.1);
//!
//! // Typing schedules a debounced search
//! let cmd = catalog.update(Message::QueryChanged("bolt".into()));
//! assert!(matches!(cmd, Cmd::ScheduleDebounce { .. }));
//! ```
//!
//! ## Modules
//!
//! - [`domain`] - Records, department context and backend wire shapes
//! - [`core`] - Commands and error types
//! - [`model`] - Search session, result cache, reconciler, scroll activator and catalog
//! - [`presentation`] - Card renderer, DOM patches and the in-memory DOM
//! - [`infrastructure`] - REST client, host capabilities, configuration and CLI
//! - [`integration`] - Command executor, runtime and terminal runner
//! - [`utils`] - Logging, panic handling and paths

pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod integration;
pub mod model;
pub mod presentation;
pub mod test_helpers;
pub mod utils;

// Re-exports for convenience
pub use crate::core::cmd::Cmd;
pub use integration::runtime::{Runtime, RuntimeStats};
pub use model::catalog::{Catalog, Message};

/// Result type used throughout the library
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
