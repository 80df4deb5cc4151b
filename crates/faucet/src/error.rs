//! Error types for the faucet

use chrono::{DateTime, Utc};
use thiserror::Error;
use ttk_common::{AmountError, TokenAmount};

/// Failures reported by a [`ChainSimulator`](crate::chain::ChainSimulator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("wallet refused the connection: {0}")]
    ConnectionRefused(String),

    #[error("transaction reverted: {0}")]
    Reverted(String),
}

/// Wallet connection errors. All of them leave the session disconnected
/// and may be retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Failed to connect wallet: {0}")]
    Rejected(String),

    #[error("Wallet connection timed out")]
    Timeout,

    #[error("Connection attempt abandoned by disconnect")]
    Superseded,
}

/// Claim rejections and failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Please connect your wallet first")]
    NotConnected,

    #[error("Next claim in {remaining_hours}h")]
    CooldownActive {
        remaining_hours: i64,
        available_at: DateTime<Utc>,
    },

    #[error("Faucet is out of funds: {reserve} TTK left, {required} TTK required")]
    ReserveExhausted {
        reserve: TokenAmount,
        required: TokenAmount,
    },

    #[error("A claim is already being processed")]
    AlreadyInProgress,

    #[error("Transaction failed: {0}")]
    ClaimTxFailed(String),
}

impl ClaimError {
    /// Stable machine-readable code, e.g. for a UI to pick an icon.
    pub fn code(&self) -> &'static str {
        match self {
            ClaimError::NotConnected => "NOT_CONNECTED",
            ClaimError::CooldownActive { .. } => "COOLDOWN_ACTIVE",
            ClaimError::ReserveExhausted { .. } => "RESERVE_EXHAUSTED",
            ClaimError::AlreadyInProgress => "ALREADY_IN_PROGRESS",
            ClaimError::ClaimTxFailed(_) => "TRANSACTION_FAILED",
        }
    }

    /// Whether trying again straight away can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClaimError::ClaimTxFailed(_) | ClaimError::AlreadyInProgress)
    }
}

/// Faucet errors
#[derive(Error, Debug)]
pub enum FaucetError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type FaucetResult<T> = Result<T, FaucetError>;
