//! TTK token faucet simulator
//!
//! A local, in-memory model of a testnet faucet:
//! - mock wallet sessions with single-flight connects
//! - fixed-amount claims gated by a 24 hour cooldown and the faucet reserve
//! - an append-only transaction log with pending/success/failed entries
//! - injectable clock, identifiers and chain latency for deterministic tests

pub mod chain;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod ids;
pub mod service;
pub mod session;
pub mod state;

pub use chain::{ChainSimulator, ScriptedChain, SimulatedChain};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FaucetConfig, HistoryPolicy};
pub use engine::{ClaimEngine, ClaimPolicy};
pub use error::{ChainError, ClaimError, ConnectError, FaucetError, FaucetResult};
pub use events::{EventBus, FaucetEvent};
pub use ids::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use service::FaucetService;
pub use session::{SessionStatus, WalletSession};
pub use state::{FaucetSnapshot, FaucetState, Transaction, TxStatus};
pub use ttk_common::TokenAmount;
