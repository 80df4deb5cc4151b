//! Claim eligibility rules and state transitions.
//!
//! Everything here is pure: each operation takes a state by reference and
//! returns the next one. Latency, locking and notifications live in
//! [`FaucetService`](crate::service::FaucetService).

use crate::config::FaucetConfig;
use crate::error::{ClaimError, FaucetError};
use crate::state::{FaucetState, Transaction, TxStatus};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use ttk_common::TokenAmount;

/// Fixed claim policy: the amount is never chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimPolicy {
    pub amount: TokenAmount,
    pub cooldown: Duration,
}

impl Default for ClaimPolicy {
    fn default() -> Self {
        Self {
            amount: TokenAmount::from_tokens(100),
            cooldown: Duration::hours(24),
        }
    }
}

impl TryFrom<&FaucetConfig> for ClaimPolicy {
    type Error = FaucetError;

    fn try_from(config: &FaucetConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            amount: config.claim_amount,
            cooldown: config.cooldown()?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClaimEngine {
    policy: ClaimPolicy,
}

impl ClaimEngine {
    pub fn new(policy: ClaimPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ClaimPolicy {
        &self.policy
    }

    /// Checks, in order: connected, cooled down, reserve sufficient.
    pub fn check(&self, connected: bool, state: &FaucetState, now: DateTime<Utc>) -> Result<(), ClaimError> {
        if !connected {
            return Err(ClaimError::NotConnected);
        }

        if let Some(available_at) = state.next_eligible_time {
            if now < available_at {
                return Err(ClaimError::CooldownActive {
                    remaining_hours: state.hours_until_next_claim(now),
                    available_at,
                });
            }
        }

        if state.faucet_reserve < self.policy.amount {
            return Err(ClaimError::ReserveExhausted {
                reserve: state.faucet_reserve,
                required: self.policy.amount,
            });
        }

        Ok(())
    }

    /// Records a new pending transaction at the head of the log.
    pub fn open_claim(&self, state: &FaucetState, now: DateTime<Utc>, reference: String) -> (FaucetState, u64) {
        let mut next = state.clone();
        let id = next.allocate_tx_id();
        next.transaction_log
            .insert(0, Transaction::pending(id, reference, self.policy.amount, now));
        debug!("Opened claim #{}", id);
        (next, id)
    }

    /// Applies a confirmed claim.
    ///
    /// Balances, reserve and cooldown move together with the transaction's
    /// transition to `Success`. On error nothing is applied and the caller
    /// is expected to settle the transaction as failed.
    pub fn settle_success(
        &self,
        state: &FaucetState,
        tx_id: u64,
        completed_at: DateTime<Utc>,
    ) -> Result<FaucetState, ClaimError> {
        let amount = match state.transaction(tx_id) {
            Some(tx) if tx.status == TxStatus::Pending => tx.amount,
            _ => return Err(ClaimError::ClaimTxFailed(format!("no pending transaction #{}", tx_id))),
        };

        let faucet_reserve = state.faucet_reserve.checked_sub(amount).ok_or(ClaimError::ReserveExhausted {
            reserve: state.faucet_reserve,
            required: amount,
        })?;
        let overflow = || ClaimError::ClaimTxFailed("balance overflow".to_string());
        let user_balance = state.user_balance.checked_add(amount).ok_or_else(overflow)?;
        let total_claimed = state.total_claimed.checked_add(amount).ok_or_else(overflow)?;
        let next_eligible_time = completed_at
            .checked_add_signed(self.policy.cooldown)
            .ok_or_else(|| ClaimError::ClaimTxFailed("cooldown deadline out of range".to_string()))?;

        let mut next = state.clone();
        next.faucet_reserve = faucet_reserve;
        next.user_balance = user_balance;
        next.total_claimed = total_claimed;
        next.next_eligible_time = Some(next_eligible_time);
        if let Some(tx) = next.transaction_mut(tx_id) {
            tx.status = TxStatus::Success;
            tx.completed_at = Some(completed_at);
        }
        Ok(next)
    }

    /// Marks a pending claim as failed. Balances and cooldown are untouched,
    /// so the user may retry immediately.
    pub fn settle_failure(
        &self,
        state: &FaucetState,
        tx_id: u64,
        completed_at: DateTime<Utc>,
        reason: &str,
    ) -> FaucetState {
        let mut next = state.clone();
        if let Some(tx) = next.transaction_mut(tx_id) {
            if tx.status == TxStatus::Pending {
                tx.status = TxStatus::Failed;
                tx.completed_at = Some(completed_at);
                tx.failure_reason = Some(reason.to_string());
            }
        }
        next
    }

    /// Check, open and confirm in one step, with no processing latency.
    pub fn claim(
        &self,
        connected: bool,
        state: &FaucetState,
        now: DateTime<Utc>,
        reference: String,
    ) -> Result<FaucetState, ClaimError> {
        self.check(connected, state, now)?;
        let (pending, tx_id) = self.open_claim(state, now, reference);
        self.settle_success(&pending, tx_id, now)
    }
}
