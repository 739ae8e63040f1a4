//! Capabilities provided by the page host
//!
//! Inside the messenger these map to native popups and the taptic engine.
//! Outside of it they degrade: alerts go to stderr, confirmations are
//! answered on the terminal and haptics are only logged.

use std::io::Write;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::core::cmd::HapticKind;

#[async_trait]
pub trait HostCapabilities: Send + Sync {
    fn alert(&self, message: &str);

    /// Ask a yes/no question; `false` when the host cannot ask
    async fn confirm(&self, prompt: &str) -> bool;

    fn haptic(&self, kind: HapticKind);
}

/// Host that ignores every request and declines every confirmation
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

#[async_trait]
impl HostCapabilities for NoopHost {
    fn alert(&self, message: &str) {
        log::debug!("Alert without host: {message}");
    }

    async fn confirm(&self, prompt: &str) -> bool {
        log::debug!("Confirm without host, declining: {prompt}");
        false
    }

    fn haptic(&self, _kind: HapticKind) {}
}

/// A confirmation waiting for the user's answer
#[derive(Debug)]
pub struct PendingConfirm {
    pub prompt: String,
    pub answer: oneshot::Sender<bool>,
}

/// Terminal stand-in for the page host
///
/// Confirmations are forwarded to whoever reads the terminal input, since
/// that reader owns stdin.
#[derive(Debug, Clone)]
pub struct TerminalHost {
    prompts: mpsc::UnboundedSender<PendingConfirm>,
}

impl TerminalHost {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingConfirm>) {
        let (prompts, receiver) = mpsc::unbounded_channel();
        (Self { prompts }, receiver)
    }

    /// Interpret a line typed in answer to a confirmation
    pub fn parse_answer(line: &str) -> bool {
        matches!(
            line.trim().to_lowercase().as_str(),
            "y" | "yes" | "т" | "так" | "ok"
        )
    }
}

#[async_trait]
impl HostCapabilities for TerminalHost {
    fn alert(&self, message: &str) {
        let mut stderr = std::io::stderr().lock();
        if let Err(e) = writeln!(stderr, "{message}") {
            log::warn!("Failed to show alert: {e}");
        }
    }

    async fn confirm(&self, prompt: &str) -> bool {
        let (answer, receiver) = oneshot::channel();
        let pending = PendingConfirm {
            prompt: prompt.to_owned(),
            answer,
        };
        if self.prompts.send(pending).is_err() {
            log::warn!("No terminal reader for confirmation, declining");
            return false;
        }
        receiver.await.unwrap_or(false)
    }

    fn haptic(&self, kind: HapticKind) {
        log::debug!("Haptic feedback: {kind}");
    }
}
