//! Administrative fund movement.
//!
//! # Data Flow
//! ```text
//! sweep(chain, asset, from)            payout(chain, asset, to, amount)
//!     → balance query                      → payout wallet signer
//!     → signer resolving `from`            → transfer of `amount`
//!     → transfer of the full balance       → one confirmation
//!     → one confirmation
//! ```

pub mod executor;

use alloy::primitives::TxHash;
use thiserror::Error;

use crate::blockchain::types::{Chain, ChainError};

pub use executor::SettlementExecutor;

/// Errors of sweep and payout operations.
///
/// Messages carry addresses and hashes only, never key material.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The sweep was mined but reverted.
    #[error("Sweep on {chain} failed in transaction {tx_hash}")]
    SweepFailed { chain: Chain, tx_hash: TxHash },

    /// The payout was mined but reverted.
    #[error("Payout on {chain} failed in transaction {tx_hash}")]
    PayoutFailed { chain: Chain, tx_hash: TxHash },

    /// Broadcast succeeded but no receipt arrived in time. Inspect the
    /// chain before retrying.
    #[error("Transaction {tx_hash} on {chain} was broadcast but not confirmed in time")]
    Unconfirmed { chain: Chain, tx_hash: TxHash },

    #[error("Payout amount must be greater than zero")]
    ZeroAmount,

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl SettlementError {
    /// The broadcast transaction, when one exists.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            SettlementError::SweepFailed { tx_hash, .. }
            | SettlementError::PayoutFailed { tx_hash, .. }
            | SettlementError::Unconfirmed { tx_hash, .. } => Some(*tx_hash),
            SettlementError::ZeroAmount | SettlementError::Chain(_) => None,
        }
    }
}

pub type SettlementResult<T> = Result<T, SettlementError>;
