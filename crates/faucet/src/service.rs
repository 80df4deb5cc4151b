//! Faucet service: owns the state and serialises commands against it.

use crate::chain::{ChainSimulator, SimulatedChain};
use crate::clock::{Clock, SystemClock};
use crate::config::{FaucetConfig, HistoryPolicy};
use crate::engine::{ClaimEngine, ClaimPolicy};
use crate::error::{ClaimError, ConnectError, FaucetResult};
use crate::events::{EventBus, FaucetEvent};
use crate::ids::{IdGenerator, RandomIdGenerator};
use crate::session::{SessionStatus, WalletSession};
use crate::state::{FaucetSnapshot, FaucetState, TxStatus};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use ttk_common::TokenAmount;

struct Ledger {
    state: FaucetState,
    /// Newest session epoch whose connect outcome has been applied and
    /// announced.
    announced_epoch: u64,
}

impl Ledger {
    /// Takes the right to announce `epoch`. Outcomes of an epoch already
    /// announced, or older than one, are dropped.
    fn claim_announcement(&mut self, epoch: u64) -> bool {
        if epoch <= self.announced_epoch {
            return false;
        }
        self.announced_epoch = epoch;
        true
    }
}

/// The single owner of a [`FaucetState`].
///
/// The presentation layer issues `connect`, `disconnect` and `claim`, and
/// reads state only through [`snapshot`](Self::snapshot). Locks are never
/// held across an await point.
pub struct FaucetService {
    config: FaucetConfig,
    engine: ClaimEngine,
    session: WalletSession,
    ledger: RwLock<Ledger>,
    claim_in_flight: Mutex<()>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    chain: Arc<dyn ChainSimulator>,
    events: EventBus,
}

impl FaucetService {
    /// Service with wall-clock time, random identifiers and the configured
    /// simulated latencies.
    pub fn new(config: FaucetConfig) -> FaucetResult<Self> {
        let chain = Arc::new(SimulatedChain::from_config(&config));
        Self::with_components(config, Arc::new(SystemClock), Arc::new(RandomIdGenerator), chain)
    }

    pub fn with_components(
        config: FaucetConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        chain: Arc<dyn ChainSimulator>,
    ) -> FaucetResult<Self> {
        config.validate()?;

        let session = WalletSession::new(chain.clone(), ids.clone(), config.connect_timeout());
        let ledger = Ledger {
            state: FaucetState::new(config.initial_reserve),
            announced_epoch: 0,
        };

        info!(
            "Faucet ready: {} TTK per claim, reserve {} TTK, cooldown {}s",
            config.claim_amount, config.initial_reserve, config.cooldown_secs
        );

        Ok(Self {
            engine: ClaimEngine::new(ClaimPolicy::try_from(&config)?),
            events: EventBus::new(config.event_capacity),
            config,
            session,
            ledger: RwLock::new(ledger),
            claim_in_flight: Mutex::new(()),
            clock,
            ids,
            chain,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.ledger.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.ledger.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn config(&self) -> &FaucetConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FaucetEvent> {
        self.events.subscribe()
    }

    pub fn session_status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Copy of the current state.
    pub fn state(&self) -> FaucetState {
        self.read().state.clone()
    }

    pub fn snapshot(&self) -> FaucetSnapshot {
        let ledger = self.read();
        FaucetSnapshot::from_state(
            &ledger.state,
            self.session.address(),
            self.engine.policy().amount,
            self.clock.now(),
        )
    }

    /// Connects the mock wallet and seeds the session balances.
    ///
    /// Concurrent callers share one attempt; the seeding and the
    /// notification happen once per attempt.
    pub async fn connect(&self) -> Result<String, ConnectError> {
        let (epoch, outcome) = self.session.connect_with_epoch().await;
        if matches!(outcome, Err(ConnectError::Superseded)) {
            return outcome;
        }

        let mut ledger = self.write();
        if !ledger.claim_announcement(epoch) {
            return outcome;
        }

        // Events go out under the ledger lock so they stay ordered with a
        // concurrent disconnect's reset and notification.
        match outcome {
            Ok(address) => {
                // a disconnect may have landed since the session committed
                if self.session.connected_epoch() != Some(epoch) {
                    debug!("Connect attempt {} was disconnected before seeding", epoch);
                    return Err(ConnectError::Superseded);
                }
                ledger
                    .state
                    .reset_session(self.config.seed_user_balance, self.config.seed_total_claimed);
                self.events.publish(FaucetEvent::Connected {
                    address: address.clone(),
                });
                Ok(address)
            }
            Err(e) => {
                self.events.publish(FaucetEvent::ConnectFailed { reason: e.to_string() });
                Err(e)
            }
        }
    }

    /// Disconnects immediately and zeroes session accounting. The log is
    /// kept or cleared according to [`HistoryPolicy`]; an in-flight claim
    /// entry always survives so it can still be settled.
    pub fn disconnect(&self) {
        let previous = self.session.disconnect();

        let mut ledger = self.write();
        ledger.state.reset_session(TokenAmount::ZERO, TokenAmount::ZERO);
        if self.config.history_policy == HistoryPolicy::Clear {
            ledger.state.transaction_log.retain(|tx| tx.status == TxStatus::Pending);
        }
        drop(ledger);

        if previous.is_some() {
            self.events.publish(FaucetEvent::Disconnected);
        }
    }

    fn reject(&self, err: ClaimError) -> ClaimError {
        match &err {
            ClaimError::CooldownActive { .. } | ClaimError::AlreadyInProgress => debug!("Claim rejected: {}", err),
            _ => warn!("Claim rejected: {}", err),
        }
        self.events.publish(FaucetEvent::rejected(&err));
        err
    }

    /// Claims the fixed amount for the connected wallet.
    ///
    /// Returns the state after the claim settled; on error the balances and
    /// cooldown are exactly as before (a failed transaction is still logged).
    pub async fn claim(&self) -> Result<FaucetState, ClaimError> {
        let _in_flight = match self.claim_in_flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => return Err(self.reject(ClaimError::AlreadyInProgress)),
        };

        let epoch = self.session.connected_epoch();
        let now = self.clock.now();

        let (tx_id, reference) = {
            let mut ledger = self.write();
            if let Err(err) = self.engine.check(epoch.is_some(), &ledger.state, now) {
                drop(ledger);
                return Err(self.reject(err));
            }
            let reference = self.ids.tx_reference();
            let (next, tx_id) = self.engine.open_claim(&ledger.state, now, reference.clone());
            ledger.state = next;
            (tx_id, reference)
        };

        info!("Claim #{} submitted: {}", tx_id, reference);
        self.events.publish(FaucetEvent::ClaimSubmitted {
            tx_id,
            reference: reference.clone(),
        });

        let amount = self.engine.policy().amount;
        let timeout = self.config.tx_timeout();
        let processed = match tokio::time::timeout(timeout, self.chain.submit_claim(&reference, amount)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("no confirmation within {}ms", timeout.as_millis())),
        };

        let completed_at = self.clock.now();
        let session_intact = self.session.connected_epoch() == epoch;

        let mut ledger = self.write();
        let settled = match processed {
            Ok(()) if session_intact => self.engine.settle_success(&ledger.state, tx_id, completed_at),
            Ok(()) => Err(ClaimError::ClaimTxFailed("wallet disconnected before confirmation".to_string())),
            Err(reason) => Err(ClaimError::ClaimTxFailed(reason)),
        };

        match settled {
            Ok(next) => {
                ledger.state = next.clone();
                drop(ledger);
                info!(
                    "Claim #{} confirmed: +{} TTK, reserve now {} TTK",
                    tx_id, amount, next.faucet_reserve
                );
                self.events.publish(FaucetEvent::ClaimSucceeded { tx_id, amount });
                Ok(next)
            }
            Err(err) => {
                let reason = match err {
                    ClaimError::ClaimTxFailed(reason) => reason,
                    other => other.to_string(),
                };
                ledger.state = self.engine.settle_failure(&ledger.state, tx_id, completed_at, &reason);
                drop(ledger);
                warn!("Claim #{} failed: {}", tx_id, reason);
                self.events.publish(FaucetEvent::ClaimFailed {
                    tx_id,
                    reason: reason.clone(),
                });
                Err(ClaimError::ClaimTxFailed(reason))
            }
        }
    }
}
