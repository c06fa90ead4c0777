//! Payment validation and settlement for a lottery backend on Arbitrum.

pub mod blockchain;
pub mod config;
pub mod observability;
pub mod payments;
pub mod settlement;

pub use blockchain::{AssetKind, Chain, ChainError, ChainRegistry};
pub use config::schema::SettlementConfig;
pub use payments::{PaymentRequest, TransferValidationResult, TransferValidator};
pub use settlement::{SettlementError, SettlementExecutor};
