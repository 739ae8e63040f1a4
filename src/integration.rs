//! Side-effect execution and the update loop
//!
//! - [`cmd_executor`]: runs catalog commands against the view, the host and the backend
//! - [`runtime`]: single-threaded dispatch loop around the catalog
//! - [`app_runner`]: line-driven terminal front end

pub mod app_runner;
pub mod cmd_executor;
pub mod runtime;
