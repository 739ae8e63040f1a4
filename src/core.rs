//! Core Elm Architecture pieces shared by every layer
//!
//! - [`cmd`]: side effects requested by the update logic
//! - [`error`]: typed failures of remote calls and reconciliation

pub mod cmd;
pub mod error;
