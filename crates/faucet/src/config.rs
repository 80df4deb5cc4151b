//! Faucet configuration

use crate::error::{FaucetError, FaucetResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use ttk_common::utils::config::load_config;
use ttk_common::utils::logging::LoggingConfig;
use ttk_common::TokenAmount;

/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "FAUCET";

/// Longest cooldown a `chrono::Duration` can hold at millisecond precision.
pub const MAX_COOLDOWN_SECS: u64 = i64::MAX as u64 / 1000;

/// What happens to the transaction log when the wallet disconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPolicy {
    /// Keep past transactions visible across sessions.
    #[default]
    Retain,
    /// Start every session with an empty log.
    Clear,
}

/// Faucet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaucetConfig {
    /// Amount handed out per successful claim
    pub claim_amount: TokenAmount,

    /// Reserve the faucet starts with
    pub initial_reserve: TokenAmount,

    /// Cooldown between successful claims (seconds)
    pub cooldown_secs: u64,

    /// Balance shown right after a wallet connects
    pub seed_user_balance: TokenAmount,

    /// Claimed total shown right after a wallet connects
    pub seed_total_claimed: TokenAmount,

    /// Transaction log handling on disconnect
    pub history_policy: HistoryPolicy,

    /// Simulated wallet handshake latency (milliseconds)
    pub connect_delay_ms: u64,

    /// Simulated claim processing latency (milliseconds)
    pub claim_delay_ms: u64,

    /// Upper bound on a connect attempt (milliseconds)
    pub connect_timeout_ms: u64,

    /// Upper bound on claim processing (milliseconds)
    pub tx_timeout_ms: u64,

    /// Probability in [0, 1] that a simulated connect fails
    pub connect_failure_rate: f64,

    /// Probability in [0, 1] that a simulated claim transaction fails
    pub claim_failure_rate: f64,

    /// Buffered notifications per subscriber
    pub event_capacity: usize,

    /// Logging setup for the binary
    pub logging: LoggingConfig,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            claim_amount: TokenAmount::from_tokens(100),
            initial_reserve: TokenAmount::from_tokens(500_000),
            cooldown_secs: 86400, // 24 hours
            seed_user_balance: TokenAmount::ZERO,
            seed_total_claimed: TokenAmount::ZERO,
            history_policy: HistoryPolicy::Retain,
            connect_delay_ms: 1500,
            claim_delay_ms: 3000,
            connect_timeout_ms: 10_000,
            tx_timeout_ms: 15_000,
            connect_failure_rate: 0.0,
            claim_failure_rate: 0.0,
            event_capacity: 64,
            logging: LoggingConfig::default(),
        }
    }
}

impl FaucetConfig {
    /// Defaults plus the demonstration balances the web faucet showed on
    /// connect (250.5 TTK held, 350 TTK claimed).
    pub fn demo() -> Self {
        Self {
            seed_user_balance: TokenAmount::from_base_units(250_500_000),
            seed_total_claimed: TokenAmount::from_tokens(350),
            ..Self::default()
        }
    }

    /// Layered load: defaults, then the optional file, then `FAUCET_*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> FaucetResult<Self> {
        let config: Self = load_config(path, ENV_PREFIX)
            .map_err(|e| FaucetError::Config(format!("{:#}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FaucetResult<()> {
        if self.claim_amount.is_zero() {
            return Err(FaucetError::Config("claim_amount must be positive".to_string()));
        }
        if self.cooldown_secs == 0 {
            return Err(FaucetError::Config("cooldown_secs must be positive".to_string()));
        }
        if self.cooldown_secs > MAX_COOLDOWN_SECS {
            return Err(FaucetError::Config(format!(
                "cooldown_secs must be at most {}, got {}",
                MAX_COOLDOWN_SECS, self.cooldown_secs
            )));
        }
        for (name, rate) in [
            ("connect_failure_rate", self.connect_failure_rate),
            ("claim_failure_rate", self.claim_failure_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(FaucetError::Config(format!("{} must be within [0, 1], got {}", name, rate)));
            }
        }
        if self.event_capacity == 0 {
            return Err(FaucetError::Config("event_capacity must be positive".to_string()));
        }
        Ok(())
    }

    /// Get claim cooldown duration
    pub fn cooldown(&self) -> FaucetResult<chrono::Duration> {
        i64::try_from(self.cooldown_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| FaucetError::Config(format!("cooldown_secs {} is out of range", self.cooldown_secs)))
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }

    pub fn claim_delay(&self) -> Duration {
        Duration::from_millis(self.claim_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn tx_timeout(&self) -> Duration {
        Duration::from_millis(self.tx_timeout_ms)
    }
}
