//! Notifications for the presentation layer.
//!
//! Every command outcome is broadcast so a UI can turn it into a toast
//! without polling.

use crate::error::ClaimError;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;
use ttk_common::TokenAmount;

/// Events emitted by the faucet service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FaucetEvent {
    /// Wallet handshake completed
    Connected { address: String },
    /// Wallet handshake failed
    ConnectFailed { reason: String },
    /// Wallet disconnected by the user
    Disconnected,
    /// Claim passed all checks and is now pending
    ClaimSubmitted { tx_id: u64, reference: String },
    /// Claim confirmed and balances credited
    ClaimSucceeded { tx_id: u64, amount: TokenAmount },
    /// Claim transaction failed after being submitted
    ClaimFailed { tx_id: u64, reason: String },
    /// Claim refused before anything was submitted
    ClaimRejected { code: &'static str, reason: String },
}

impl FaucetEvent {
    pub fn rejected(err: &ClaimError) -> Self {
        FaucetEvent::ClaimRejected {
            code: err.code(),
            reason: err.to_string(),
        }
    }

    /// Whether a UI should present this as an error.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            FaucetEvent::ConnectFailed { .. } | FaucetEvent::ClaimFailed { .. } | FaucetEvent::ClaimRejected { .. }
        )
    }

    /// One-line message suitable for a toast.
    pub fn message(&self) -> String {
        match self {
            FaucetEvent::Connected { .. } => "Wallet connected successfully!".to_string(),
            FaucetEvent::ConnectFailed { reason } => format!("Failed to connect wallet: {}", reason),
            FaucetEvent::Disconnected => "Wallet disconnected".to_string(),
            FaucetEvent::ClaimSubmitted { .. } => "Processing transaction...".to_string(),
            FaucetEvent::ClaimSucceeded { amount, .. } => format!("{} TTK tokens claimed successfully!", amount),
            FaucetEvent::ClaimFailed { reason, .. } => format!("Transaction failed: {}", reason),
            FaucetEvent::ClaimRejected { reason, .. } => reason.clone(),
        }
    }
}

/// Fan-out of [`FaucetEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<FaucetEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FaucetEvent> {
        self.sender.subscribe()
    }

    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: FaucetEvent) {
        trace!(?event, "publishing event");
        let _ = self.sender.send(event);
    }
}
