//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! SettlementConfig
//!     → registry.rs (per-chain config, cached clients)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → wallet.rs (seed phrase → derived signers)
//!     → transaction.rs (build native / token transfers)
//! ```
//!
//! # Security Constraints
//! - Seed phrase ONLY from configuration, never logged
//! - Derived signers are never cached
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod erc20;
pub mod registry;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{ChainClient, ChainReceipt, ChainTransaction, RpcChainClient};
pub use registry::ChainRegistry;
pub use types::{AssetKind, Chain, ChainConfig, ChainError, ChainResult, NATIVE_DECIMALS};
pub use wallet::{DerivedSigner, KeyDerivation};
