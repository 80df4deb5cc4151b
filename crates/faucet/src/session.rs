//! Wallet connection lifecycle.

use crate::chain::ChainSimulator;
use crate::error::ConnectError;
use crate::ids::{abbreviate, IdGenerator};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

type ConnectFuture = Shared<BoxFuture<'static, Result<String, ConnectError>>>;

/// Wallet connection state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected { address: String },
}

impl SessionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionStatus::Connected { .. })
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            SessionStatus::Connected { address } => Some(address),
            _ => None,
        }
    }

    /// `0x1234...abcd` when connected.
    pub fn display_name(&self) -> String {
        match self {
            SessionStatus::Connected { address } => abbreviate(address, 6, 4),
            SessionStatus::Connecting => "connecting...".to_string(),
            SessionStatus::Disconnected => "not connected".to_string(),
        }
    }
}

#[derive(Default)]
struct SessionInner {
    status: SessionStatus,
    /// Bumped whenever a connect starts or the session is torn down, so
    /// stale completions can tell they no longer own the session.
    epoch: u64,
    in_flight: Option<(u64, ConnectFuture)>,
}

/// Mock wallet session. At most one connect attempt runs at a time; callers
/// arriving while one is in flight wait for that same attempt.
pub struct WalletSession {
    inner: Mutex<SessionInner>,
    chain: Arc<dyn ChainSimulator>,
    ids: Arc<dyn IdGenerator>,
    connect_timeout: Duration,
}

impl WalletSession {
    pub fn new(chain: Arc<dyn ChainSimulator>, ids: Arc<dyn IdGenerator>, connect_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(SessionInner::default()),
            chain,
            ids,
            connect_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status.clone()
    }

    pub fn address(&self) -> Option<String> {
        self.lock().status.address().map(str::to_string)
    }

    pub fn is_connected(&self) -> bool {
        self.lock().status.is_connected()
    }

    /// Identifies the current connection; changes on every connect attempt
    /// and every disconnect.
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Epoch of the live connection, `None` unless connected. Read under a
    /// single lock so the two cannot disagree.
    pub fn connected_epoch(&self) -> Option<u64> {
        let inner = self.lock();
        inner.status.is_connected().then_some(inner.epoch)
    }

    /// Connects the wallet and returns its address.
    ///
    /// Already connected: returns the current address. Connecting: joins the
    /// attempt in flight and reports its outcome.
    pub async fn connect(&self) -> Result<String, ConnectError> {
        self.connect_with_epoch().await.1
    }

    /// Like [`connect`](Self::connect), also returning the epoch the outcome
    /// belongs to, captured under the same lock that committed it.
    pub async fn connect_with_epoch(&self) -> (u64, Result<String, ConnectError>) {
        let (epoch, attempt) = {
            let mut inner = self.lock();
            if let SessionStatus::Connected { address } = &inner.status {
                return (inner.epoch, Ok(address.clone()));
            }
            match inner.in_flight.clone() {
                Some(in_flight) => {
                    debug!("Connect already in flight, joining attempt {}", in_flight.0);
                    in_flight
                }
                None => {
                    inner.epoch += 1;
                    let attempt = Self::attempt(self.chain.clone(), self.ids.clone(), self.connect_timeout)
                        .boxed()
                        .shared();
                    inner.status = SessionStatus::Connecting;
                    inner.in_flight = Some((inner.epoch, attempt.clone()));
                    debug!("Starting connect attempt {}", inner.epoch);
                    (inner.epoch, attempt)
                }
            }
        };

        let outcome = attempt.await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            debug!("Connect attempt {} finished after disconnect", epoch);
            return (epoch, Err(ConnectError::Superseded));
        }
        // first caller back commits the outcome for everyone
        if inner.in_flight.take().is_some() {
            match &outcome {
                Ok(address) => {
                    info!("Wallet connected: {}", address);
                    inner.status = SessionStatus::Connected { address: address.clone() };
                }
                Err(e) => {
                    warn!("Wallet connection failed: {}", e);
                    inner.status = SessionStatus::Disconnected;
                }
            }
        }
        (epoch, outcome)
    }

    async fn attempt(
        chain: Arc<dyn ChainSimulator>,
        ids: Arc<dyn IdGenerator>,
        timeout: Duration,
    ) -> Result<String, ConnectError> {
        match tokio::time::timeout(timeout, chain.connect_wallet()).await {
            Ok(Ok(())) => Ok(ids.wallet_address()),
            Ok(Err(e)) => Err(ConnectError::Rejected(e.to_string())),
            Err(_) => Err(ConnectError::Timeout),
        }
    }

    /// Drops the connection, or abandons a connect in flight. Returns the
    /// address that was connected, if any.
    pub fn disconnect(&self) -> Option<String> {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.in_flight = None;
        let previous = std::mem::take(&mut inner.status);
        match previous {
            SessionStatus::Connected { address } => {
                info!("Wallet disconnected: {}", address);
                Some(address)
            }
            _ => None,
        }
    }
}
