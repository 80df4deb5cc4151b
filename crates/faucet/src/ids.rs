//! Mock identifier generation for wallet addresses and transaction hashes.

use rand::RngCore;
use std::sync::atomic::{AtomicU64, Ordering};

/// Byte length of a mock wallet address.
pub const ADDRESS_BYTES: usize = 20;
/// Byte length of a mock transaction reference.
pub const REFERENCE_BYTES: usize = 32;

/// Source of opaque identifiers handed out by the faucet.
pub trait IdGenerator: Send + Sync {
    /// A fresh `0x`-prefixed wallet address.
    fn wallet_address(&self) -> String;

    /// A fresh `0x`-prefixed transaction reference.
    fn tx_reference(&self) -> String;
}

/// Random hex identifiers, the production default.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl RandomIdGenerator {
    fn random_hex(len: usize) -> String {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        format!("0x{}", hex::encode(bytes))
    }
}

impl IdGenerator for RandomIdGenerator {
    fn wallet_address(&self) -> String {
        Self::random_hex(ADDRESS_BYTES)
    }

    fn tx_reference(&self) -> String {
        Self::random_hex(REFERENCE_BYTES)
    }
}

/// Deterministic identifiers: `0x…01`, `0x…02`, … shared across both kinds.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn wallet_address(&self) -> String {
        format!("0x{:0width$x}", self.next(), width = ADDRESS_BYTES * 2)
    }

    fn tx_reference(&self) -> String {
        format!("0x{:0width$x}", self.next(), width = REFERENCE_BYTES * 2)
    }
}

/// Shortens an identifier for display, e.g. `0x1234...abcd`.
///
/// Identifiers too short to benefit are returned unchanged.
pub fn abbreviate(id: &str, head: usize, tail: usize) -> String {
    if !id.is_ascii() || id.len() <= head + tail + 3 {
        return id.to_string();
    }
    format!("{}...{}", &id[..head], &id[id.len() - tail..])
}
