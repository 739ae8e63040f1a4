//! Infrastructure layer
//!
//! This module handles external integrations:
//! - Catalog REST API client
//! - Page host capabilities (alerts, confirmations, haptics)
//! - Configuration and CLI argument processing

pub mod catalog_client;
pub mod cli;
pub mod config;
pub mod host;
