//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! settlement engine. All types derive Serde traits so the same structure
//! can come from a TOML file or from environment variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

use crate::blockchain::types::Chain;

/// Upper bound (exclusive) of the account index scan used to find the
/// signer for a known address. Keeping it small bounds the latency of a
/// lookup; wallets that must be controlled have to live below it.
pub const DEFAULT_SCAN_LIMIT: u32 = 10;

/// Root configuration for the settlement engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SettlementConfig {
    /// Active chain toggle. Unset or unrecognized selects the testnet.
    pub active_chain: String,

    /// Secret phrase every signer is derived from.
    #[serde(skip_serializing)]
    pub seed_phrase: SeedPhrase,

    /// Per-chain endpoint, token and wallet settings.
    pub chains: ChainsConfig,

    /// Native-asset specific settings.
    pub native: NativeAssetConfig,

    /// RPC timing and gas settings.
    pub rpc: RpcConfig,

    /// Signer derivation settings.
    pub derivation: DerivationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Seed phrase held in memory only for as long as the config lives.
///
/// Never printed and wiped on drop.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SeedPhrase(String);

impl SeedPhrase {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self(phrase.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn expose(&self) -> &str {
        self.0.trim()
    }
}

impl fmt::Debug for SeedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("SeedPhrase(<unset>)")
        } else {
            f.write_str("SeedPhrase(<redacted>)")
        }
    }
}

impl Drop for SeedPhrase {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Settings for each supported chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainsConfig {
    pub arbitrum_sepolia: ChainSettings,
    pub arbitrum_one: ChainSettings,
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self {
            arbitrum_sepolia: ChainSettings::default(),
            arbitrum_one: ChainSettings::default(),
        }
    }
}

impl ChainsConfig {
    pub fn get(&self, chain: Chain) -> &ChainSettings {
        match chain {
            Chain::ArbitrumSepolia => &self.arbitrum_sepolia,
            Chain::ArbitrumOne => &self.arbitrum_one,
        }
    }

    pub fn get_mut(&mut self, chain: Chain) -> &mut ChainSettings {
        match chain {
            Chain::ArbitrumSepolia => &mut self.arbitrum_sepolia,
            Chain::ArbitrumOne => &mut self.arbitrum_one,
        }
    }
}

/// Raw settings of one chain, before normalization.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainSettings {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Stablecoin contract address. Blank for native-only deployments.
    pub token_address: String,

    /// Stablecoin precision.
    pub token_decimals: u8,

    /// Wallet receiving customer payments.
    pub deposit_wallet: String,

    /// Treasury wallet.
    pub treasury_wallet: String,

    /// Wallet that sweeps land in and payouts are paid from.
    pub payout_wallet: String,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            failover_urls: Vec::new(),
            token_address: String::new(),
            token_decimals: 6,
            deposit_wallet: String::new(),
            treasury_wallet: String::new(),
            payout_wallet: String::new(),
        }
    }
}

/// Native-asset payment settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NativeAssetConfig {
    /// Destinations that never count as a valid payment.
    pub blocked_addresses: Vec<String>,
}

/// RPC timing and gas configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Timeout of a single RPC request in seconds.
    pub request_timeout_secs: u64,

    /// How long transfer validation waits for a transaction to be mined.
    pub wait_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Gas price multiplier (1.0 = node estimate, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            wait_timeout_secs: 60,
            poll_interval_ms: 2000,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 100,
        }
    }
}

/// Signer derivation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// Number of account indices scanned when resolving an address.
    pub scan_limit: u32,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
