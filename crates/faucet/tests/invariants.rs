//! Randomised operation sequences checked against the faucet's accounting
//! rules.

use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use ttk_faucet::{
    ChainError, ClaimError, FaucetConfig, FaucetService, ManualClock, ScriptedChain, SequentialIdGenerator,
    TokenAmount, TxStatus,
};

#[tokio::test]
async fn test_random_operation_sequences_preserve_accounting() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let config = FaucetConfig {
            initial_reserve: TokenAmount::from_tokens(1_000),
            cooldown_secs: 3600,
            ..Default::default()
        };
        let amount = config.claim_amount;
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let chain = Arc::new(ScriptedChain::new());
        let service = FaucetService::with_components(
            config,
            Arc::new(clock.clone()),
            Arc::new(SequentialIdGenerator::new()),
            chain.clone(),
        )
        .unwrap();

        for _ in 0..60 {
            let before = service.state();
            match rng.gen_range(0..10) {
                0 => {
                    if rng.gen_bool(0.3) {
                        chain.push_connect(Err(ChainError::ConnectionRefused("denied".into())));
                    }
                    let _ = service.connect().await;
                }
                1 => service.disconnect(),
                2 | 3 => {
                    clock.advance(Duration::minutes(rng.gen_range(1..120)));
                }
                _ => {
                    if rng.gen_bool(0.25) {
                        chain.push_claim(Err(ChainError::Reverted("dropped".into())));
                    }
                    let result = service.claim().await;
                    let after = service.state();

                    match result {
                        Ok(state) => {
                            assert_eq!(state, after);
                            assert_eq!(after.user_balance, before.user_balance.checked_add(amount).unwrap());
                            assert_eq!(after.total_claimed, before.total_claimed.checked_add(amount).unwrap());
                            assert_eq!(after.faucet_reserve, before.faucet_reserve.checked_sub(amount).unwrap());
                            assert_eq!(after.transaction_log.len(), before.transaction_log.len() + 1);
                            assert_eq!(after.transaction_log[0].status, TxStatus::Success);
                        }
                        Err(ClaimError::ClaimTxFailed(_)) => {
                            assert_eq!(after.user_balance, before.user_balance);
                            assert_eq!(after.total_claimed, before.total_claimed);
                            assert_eq!(after.faucet_reserve, before.faucet_reserve);
                            assert_eq!(after.next_eligible_time, before.next_eligible_time);
                            assert_eq!(after.transaction_log.len(), before.transaction_log.len() + 1);
                            assert_eq!(after.transaction_log[0].status, TxStatus::Failed);
                        }
                        Err(_) => assert_eq!(after, before),
                    }
                }
            }

            let state = service.state();
            assert!(state.faucet_reserve <= TokenAmount::from_tokens(1_000));
            // every credited token came out of the reserve
            let successes = state
                .transaction_log
                .iter()
                .filter(|tx| tx.status == TxStatus::Success)
                .count() as u128;
            assert_eq!(
                state.faucet_reserve.base_units() + successes * amount.base_units(),
                TokenAmount::from_tokens(1_000).base_units()
            );
            assert!(state.pending_transaction().is_none());
        }
    }
}
