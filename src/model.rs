//! State of the catalog screen, following the Elm Architecture
//!
//! Each child owns one concern and changes only through its `update`:
//! - [`search_session`]: query, paging cursor and in-flight guard
//! - [`reconciler`]: result cache and department locks
//! - [`scroll_activator`]: infinite scroll sentinel
//!
//! [`catalog`] coordinates them.

pub mod catalog;
pub mod reconciler;
pub mod result_cache;
pub mod scroll_activator;
pub mod search_session;
