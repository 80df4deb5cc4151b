//! Shared building blocks for the TTK faucet workspace.

pub mod types;
pub mod utils;

pub use types::{AmountError, TokenAmount, TOKEN_DECIMALS};
