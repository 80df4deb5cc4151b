//! Faucet data model: balances, cooldown deadline and transaction log.

use crate::ids::abbreviate;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ttk_common::TokenAmount;

/// Lifecycle of a claim transaction. `Success` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Success,
    Failed,
}

impl TxStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxStatus::Pending)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxStatus::Pending => "pending",
            TxStatus::Success => "success",
            TxStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One claim attempt as recorded in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    /// Mock transaction hash
    pub reference: String,
    pub amount: TokenAmount,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    pub status: TxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl Transaction {
    pub fn pending(id: u64, reference: String, amount: TokenAmount, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            reference,
            amount,
            timestamp,
            status: TxStatus::Pending,
            completed_at: None,
            failure_reason: None,
        }
    }

    /// `0x123456...abcdef`
    pub fn short_reference(&self) -> String {
        abbreviate(&self.reference, 8, 6)
    }
}

/// Complete faucet state for one running session.
///
/// Values are replaced wholesale by the claim engine; nothing outside the
/// engine mutates a state that has been published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetState {
    pub user_balance: TokenAmount,
    pub total_claimed: TokenAmount,
    pub faucet_reserve: TokenAmount,
    /// `None` until the first successful claim.
    pub next_eligible_time: Option<DateTime<Utc>>,
    /// Newest first.
    pub transaction_log: Vec<Transaction>,
    next_tx_id: u64,
}

impl FaucetState {
    pub fn new(initial_reserve: TokenAmount) -> Self {
        Self {
            user_balance: TokenAmount::ZERO,
            total_claimed: TokenAmount::ZERO,
            faucet_reserve: initial_reserve,
            next_eligible_time: None,
            transaction_log: Vec::new(),
            next_tx_id: 1,
        }
    }

    /// Claims are blocked on the raw deadline, never on rounded hours.
    pub fn is_cooling_down(&self, now: DateTime<Utc>) -> bool {
        matches!(self.next_eligible_time, Some(next) if now < next)
    }

    /// Hours until the next claim, rounded up, 0 once eligible. Display only.
    pub fn hours_until_next_claim(&self, now: DateTime<Utc>) -> i64 {
        match self.next_eligible_time {
            Some(next) if now < next => {
                let remaining = next - now;
                let whole = remaining.num_hours();
                match Duration::try_hours(whole) {
                    Some(covered) if remaining <= covered => whole,
                    _ => whole + 1,
                }
            }
            _ => 0,
        }
    }

    pub fn transaction(&self, id: u64) -> Option<&Transaction> {
        self.transaction_log.iter().find(|tx| tx.id == id)
    }

    pub fn pending_transaction(&self) -> Option<&Transaction> {
        self.transaction_log.iter().find(|tx| tx.status == TxStatus::Pending)
    }

    pub(crate) fn transaction_mut(&mut self, id: u64) -> Option<&mut Transaction> {
        self.transaction_log.iter_mut().find(|tx| tx.id == id)
    }

    pub(crate) fn allocate_tx_id(&mut self) -> u64 {
        let id = self.next_tx_id;
        self.next_tx_id += 1;
        id
    }

    /// Session-scoped accounting set on connect and disconnect.
    pub(crate) fn reset_session(&mut self, user_balance: TokenAmount, total_claimed: TokenAmount) {
        self.user_balance = user_balance;
        self.total_claimed = total_claimed;
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetSnapshot {
    pub connected: bool,
    pub address: Option<String>,
    pub user_balance: TokenAmount,
    pub faucet_reserve: TokenAmount,
    pub total_claimed: TokenAmount,
    /// Fixed amount a claim hands out
    pub claim_amount: TokenAmount,
    pub hours_until_next_claim: i64,
    pub claim_in_progress: bool,
    pub transaction_log: Vec<Transaction>,
}

impl FaucetSnapshot {
    pub fn from_state(
        state: &FaucetState,
        address: Option<String>,
        claim_amount: TokenAmount,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            connected: address.is_some(),
            address,
            user_balance: state.user_balance,
            faucet_reserve: state.faucet_reserve,
            total_claimed: state.total_claimed,
            claim_amount,
            hours_until_next_claim: state.hours_until_next_claim(now),
            claim_in_progress: state.pending_transaction().is_some(),
            transaction_log: state.transaction_log.clone(),
        }
    }

    /// Whether the claim button would be enabled.
    pub fn can_claim(&self) -> bool {
        self.connected
            && !self.claim_in_progress
            && self.hours_until_next_claim == 0
            && self.faucet_reserve >= self.claim_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_new_state() {
        let state = FaucetState::new(TokenAmount::from_tokens(500_000));
        assert_eq!(state.user_balance, TokenAmount::ZERO);
        assert_eq!(state.next_eligible_time, None);
        assert!(!state.is_cooling_down(t0()));
        assert_eq!(state.hours_until_next_claim(t0()), 0);
    }

    #[test]
    fn test_hours_until_next_claim_rounds_up() {
        let mut state = FaucetState::new(TokenAmount::from_tokens(500_000));
        state.next_eligible_time = Some(t0() + Duration::hours(24));

        assert_eq!(state.hours_until_next_claim(t0()), 24);
        assert_eq!(state.hours_until_next_claim(t0() + Duration::seconds(1)), 24);
        assert_eq!(state.hours_until_next_claim(t0() + Duration::hours(23)), 1);
        assert_eq!(
            state.hours_until_next_claim(t0() + Duration::hours(24) - Duration::seconds(1)),
            1
        );
        assert_eq!(state.hours_until_next_claim(t0() + Duration::hours(24)), 0);
        assert_eq!(state.hours_until_next_claim(t0() + Duration::hours(30)), 0);
    }

    #[test]
    fn test_hours_until_next_claim_far_deadline() {
        let mut state = FaucetState::new(TokenAmount::from_tokens(500_000));
        state.next_eligible_time = Some(t0() + Duration::days(90_000_000));

        assert_eq!(state.hours_until_next_claim(t0()), 2_160_000_000);
        assert_eq!(state.hours_until_next_claim(t0() + Duration::seconds(1)), 2_160_000_000);
        assert_eq!(state.hours_until_next_claim(t0() + Duration::hours(1)), 2_159_999_999);
    }

    #[test]
    fn test_cooldown_uses_raw_deadline() {
        let mut state = FaucetState::new(TokenAmount::from_tokens(500_000));
        let deadline = t0() + Duration::hours(24);
        state.next_eligible_time = Some(deadline);

        assert!(state.is_cooling_down(deadline - Duration::milliseconds(1)));
        assert!(!state.is_cooling_down(deadline));
    }

    #[test]
    fn test_tx_ids_are_monotonic() {
        let mut state = FaucetState::new(TokenAmount::ZERO);
        let first = state.allocate_tx_id();
        let second = state.allocate_tx_id();
        assert!(second > first);
    }

    #[test]
    fn test_short_reference() {
        let tx = Transaction::pending(
            1,
            format!("0x{}", "ab".repeat(32)),
            TokenAmount::from_tokens(100),
            t0(),
        );
        assert_eq!(tx.short_reference(), "0xababab...ababab");
        assert!(!tx.status.is_terminal());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut state = FaucetState::new(TokenAmount::from_tokens(500_000));
        state.next_eligible_time = Some(t0() + Duration::hours(2));
        let id = state.allocate_tx_id();
        state
            .transaction_log
            .insert(0, Transaction::pending(id, "0x01".into(), TokenAmount::from_tokens(100), t0()));

        let snapshot = FaucetSnapshot::from_state(&state, Some("0xabc".into()), TokenAmount::from_tokens(100), t0());
        assert!(snapshot.connected);
        assert!(snapshot.claim_in_progress);
        assert_eq!(snapshot.hours_until_next_claim, 2);
        assert!(!snapshot.can_claim());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["faucet_reserve"], "500000");
        assert_eq!(json["transaction_log"][0]["status"], "pending");
    }

    #[test]
    fn test_can_claim_needs_enough_reserve() {
        let amount = TokenAmount::from_tokens(100);
        let mut state = FaucetState::new(amount);
        let address = Some("0xabc".to_string());

        assert!(FaucetSnapshot::from_state(&state, address.clone(), amount, t0()).can_claim());
        assert!(!FaucetSnapshot::from_state(&state, None, amount, t0()).can_claim());

        state.faucet_reserve = TokenAmount::from_tokens(99);
        assert!(!FaucetSnapshot::from_state(&state, address, amount, t0()).can_claim());
    }
}
