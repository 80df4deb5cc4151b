//! Simulated chain interactions.
//!
//! Nothing here talks to a network. The wallet handshake and the claim
//! transaction are modelled as asynchronous operations with configurable
//! latency and outcome, so the service can be driven instantly and
//! deterministically in tests.

use crate::config::FaucetConfig;
use crate::error::ChainError;
use async_trait::async_trait;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use ttk_common::TokenAmount;

#[async_trait]
pub trait ChainSimulator: Send + Sync {
    /// Performs the wallet handshake.
    async fn connect_wallet(&self) -> Result<(), ChainError>;

    /// Submits a claim transaction and waits for it to settle.
    async fn submit_claim(&self, reference: &str, amount: TokenAmount) -> Result<(), ChainError>;
}

/// Sleeps for a fixed latency, then fails with the configured probability.
#[derive(Debug, Clone)]
pub struct SimulatedChain {
    connect_delay: Duration,
    claim_delay: Duration,
    connect_failure_rate: f64,
    claim_failure_rate: f64,
}

impl SimulatedChain {
    pub fn new(connect_delay: Duration, claim_delay: Duration) -> Self {
        Self {
            connect_delay,
            claim_delay,
            connect_failure_rate: 0.0,
            claim_failure_rate: 0.0,
        }
    }

    pub fn from_config(config: &FaucetConfig) -> Self {
        Self::new(config.connect_delay(), config.claim_delay())
            .with_failure_rates(config.connect_failure_rate, config.claim_failure_rate)
    }

    /// Rates are clamped to `[0, 1]`.
    pub fn with_failure_rates(mut self, connect: f64, claim: f64) -> Self {
        self.connect_failure_rate = connect.clamp(0.0, 1.0);
        self.claim_failure_rate = claim.clamp(0.0, 1.0);
        self
    }

    fn roll(rate: f64) -> bool {
        rate > 0.0 && rand::thread_rng().gen_bool(rate)
    }
}

#[async_trait]
impl ChainSimulator for SimulatedChain {
    async fn connect_wallet(&self) -> Result<(), ChainError> {
        tokio::time::sleep(self.connect_delay).await;
        if Self::roll(self.connect_failure_rate) {
            return Err(ChainError::ConnectionRefused("user rejected the request".to_string()));
        }
        Ok(())
    }

    async fn submit_claim(&self, reference: &str, amount: TokenAmount) -> Result<(), ChainError> {
        debug!("Submitting claim {} for {} TTK", reference, amount);
        tokio::time::sleep(self.claim_delay).await;
        if Self::roll(self.claim_failure_rate) {
            return Err(ChainError::Reverted("simulated network failure".to_string()));
        }
        Ok(())
    }
}

/// Zero-latency chain that replays queued outcomes, succeeding once the
/// queue for an operation runs dry.
#[derive(Debug, Default)]
pub struct ScriptedChain {
    connects: Mutex<VecDeque<Result<(), ChainError>>>,
    claims: Mutex<VecDeque<Result<(), ChainError>>>,
}

impl ScriptedChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_connect(&self, outcome: Result<(), ChainError>) {
        lock(&self.connects).push_back(outcome);
    }

    pub fn push_claim(&self, outcome: Result<(), ChainError>) {
        lock(&self.claims).push_back(outcome);
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ChainSimulator for ScriptedChain {
    async fn connect_wallet(&self) -> Result<(), ChainError> {
        lock(&self.connects).pop_front().unwrap_or(Ok(()))
    }

    async fn submit_claim(&self, _reference: &str, _amount: TokenAmount) -> Result<(), ChainError> {
        lock(&self.claims).pop_front().unwrap_or(Ok(()))
    }
}
