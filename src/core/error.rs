use thiserror::Error;

use crate::domain::ProductId;

/// A remote call that did not produce a usable answer
///
/// Cloneable so that it can travel back to the update loop inside a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl FetchError {
    /// Text suitable for showing to the user
    pub fn user_message(&self) -> &str {
        match self {
            FetchError::Request(message)
            | FetchError::Status { message, .. }
            | FetchError::Decode(message) => message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("product {0} is not in the result cache")]
    NotFound(ProductId),
}
