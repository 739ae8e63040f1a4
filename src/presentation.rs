//! Presentation layer
//!
//! - [`renderer`]: pure markup rendering
//! - [`patch`]: DOM operations produced by the model
//! - [`virtual_dom`]: in-memory document the operations are applied to

pub mod patch;
pub mod renderer;
pub mod virtual_dom;
