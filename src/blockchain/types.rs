//! Chain identifiers, per-chain configuration and error definitions.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::ChainSettings;

/// Decimal precision of the native asset (wei).
pub const NATIVE_DECIMALS: u8 = 18;

/// Supported rollup networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chain {
    /// Arbitrum Sepolia testnet (chain ID 421614).
    #[serde(rename = "arbitrum-sepolia")]
    ArbitrumSepolia,
    /// Arbitrum One mainnet (chain ID 42161).
    #[serde(rename = "arbitrum-one")]
    ArbitrumOne,
}

impl Chain {
    /// Every supported chain, testnet first.
    pub const ALL: [Chain; 2] = [Chain::ArbitrumSepolia, Chain::ArbitrumOne];

    /// EIP-155 chain id.
    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::ArbitrumSepolia => 421_614,
            Chain::ArbitrumOne => 42_161,
        }
    }

    /// Chain id as a `0x`-prefixed hex string.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id())
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Chain::ArbitrumOne)
    }

    /// Resolve the active chain from the runtime toggle.
    ///
    /// Anything unset or unrecognized selects the testnet.
    pub fn from_toggle(toggle: &str) -> Self {
        toggle.parse().unwrap_or(Chain::ArbitrumSepolia)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chain::ArbitrumSepolia => write!(f, "arbitrum-sepolia"),
            Chain::ArbitrumOne => write!(f, "arbitrum-one"),
        }
    }
}

impl FromStr for Chain {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arbitrum-sepolia" | "arbitrum_sepolia" | "sepolia" | "testnet" => {
                Ok(Chain::ArbitrumSepolia)
            }
            "arbitrum-one" | "arbitrum_one" | "one" | "mainnet" => Ok(Chain::ArbitrumOne),
            other => Err(ChainError::UnknownChain(other.to_string())),
        }
    }
}

/// Which asset a payment or transfer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// ERC-20 stablecoin configured per chain.
    Token,
    /// The chain's native asset.
    Native,
}

/// Immutable configuration of one chain.
///
/// Every address is stored lower-case. Blank strings mean "not configured";
/// callers reject them through the typed accessors before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain: Chain,
    pub chain_id_hex: String,
    pub rpc_endpoint: String,
    pub failover_rpc_endpoints: Vec<String>,
    /// Absent for native-only deployments.
    pub token_contract_address: Option<String>,
    pub deposit_wallet_address: String,
    pub treasury_wallet_address: String,
    pub payout_wallet_address: String,
    /// Precision of the token asset.
    pub decimal_precision: u8,
    /// Parsed once; malformed entries are reported by `validate_config`.
    pub blocked_addresses: Vec<Address>,
}

impl ChainConfig {
    /// Build the configuration for `chain` from raw settings.
    pub fn from_settings(chain: Chain, settings: &ChainSettings, blocked: &[String]) -> Self {
        let token = normalize(&settings.token_address);
        Self {
            chain,
            chain_id_hex: chain.chain_id_hex(),
            rpc_endpoint: settings.rpc_url.trim().to_string(),
            failover_rpc_endpoints: settings
                .failover_urls
                .iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect(),
            token_contract_address: (!token.is_empty()).then_some(token),
            deposit_wallet_address: normalize(&settings.deposit_wallet),
            treasury_wallet_address: normalize(&settings.treasury_wallet),
            payout_wallet_address: normalize(&settings.payout_wallet),
            decimal_precision: settings.token_decimals,
            blocked_addresses: blocked
                .iter()
                .filter_map(|a| parse_address("blocked_addresses", a).ok())
                .collect(),
        }
    }

    /// Precision of amounts of the given asset on this chain.
    pub fn decimals_for(&self, asset: AssetKind) -> u8 {
        match asset {
            AssetKind::Token => self.decimal_precision,
            AssetKind::Native => NATIVE_DECIMALS,
        }
    }

    pub fn token_address(&self) -> ChainResult<Address> {
        match &self.token_contract_address {
            Some(addr) => parse_address("token_address", addr),
            None => Err(ChainError::NotConfigured {
                chain: self.chain,
                field: "token_address",
            }),
        }
    }

    pub fn deposit_address(&self) -> ChainResult<Address> {
        self.required_address("deposit_wallet", &self.deposit_wallet_address)
    }

    pub fn treasury_address(&self) -> ChainResult<Address> {
        self.required_address("treasury_wallet", &self.treasury_wallet_address)
    }

    pub fn payout_address(&self) -> ChainResult<Address> {
        self.required_address("payout_wallet", &self.payout_wallet_address)
    }

    /// Whether `address` appears on the blocked-destination list.
    pub fn is_blocked(&self, address: Address) -> bool {
        self.blocked_addresses.contains(&address)
    }

    fn required_address(&self, field: &'static str, value: &str) -> ChainResult<Address> {
        if value.is_empty() {
            return Err(ChainError::NotConfigured {
                chain: self.chain,
                field,
            });
        }
        parse_address(field, value)
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Parse a hex address, case-insensitively.
pub fn parse_address(field: &str, value: &str) -> ChainResult<Address> {
    value
        .trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|e| ChainError::InvalidAddress(format!("{field} '{value}': {e}")))
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// A required chain setting is blank.
    #[error("{chain} is not configured: missing {field}")]
    NotConfigured { chain: Chain, field: &'static str },

    /// Address string could not be parsed.
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Unknown chain '{0}'")]
    UnknownChain(String),

    /// Key derivation is impossible (no seed phrase).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// None of the scanned account indices derive the requested address.
    #[error("Address {address} is not derivable within account indices 0..{scanned}")]
    AddressNotDerivable { address: Address, scanned: u32 },

    /// Signer construction or signing failed.
    #[error("Signer error: {0}")]
    Signer(String),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Amount precision does not match the asset being handled.
    #[error("Amount has {actual} decimals, asset expects {expected}")]
    PrecisionMismatch { expected: u8, actual: u8 },
}

/// Result type for blockchain operations.
pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    fn settings() -> ChainSettings {
        ChainSettings {
            rpc_url: " https://sepolia-rollup.arbitrum.io/rpc ".to_string(),
            failover_urls: vec!["".to_string()],
            token_address: "0x75FAF114EAFB1BDBE2F0316DF893FD58CE46AA4D".to_string(),
            token_decimals: 6,
            deposit_wallet: "0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266".to_string(),
            treasury_wallet: String::new(),
            payout_wallet: "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string(),
        }
    }

    #[test]
    fn test_chain_parsing_and_display() {
        assert_eq!("arbitrum-one".parse::<Chain>().unwrap(), Chain::ArbitrumOne);
        assert_eq!("Mainnet".parse::<Chain>().unwrap(), Chain::ArbitrumOne);
        assert_eq!("testnet".parse::<Chain>().unwrap(), Chain::ArbitrumSepolia);
        assert!("polygon".parse::<Chain>().is_err());
        assert_eq!(Chain::ArbitrumSepolia.to_string(), "arbitrum-sepolia");
        assert_eq!(Chain::ArbitrumOne.chain_id_hex(), "0xa4b1");
        assert_eq!(Chain::ArbitrumSepolia.chain_id_hex(), "0x66eee");
    }

    #[test]
    fn test_toggle_defaults_to_testnet() {
        assert_eq!(Chain::from_toggle(""), Chain::ArbitrumSepolia);
        assert_eq!(Chain::from_toggle("production-ish"), Chain::ArbitrumSepolia);
        assert_eq!(Chain::from_toggle("arbitrum-one"), Chain::ArbitrumOne);
    }

    #[test]
    fn test_config_normalizes_addresses() {
        let blocked = vec![" 0xDEAD000000000000000000000000000000000000".to_string()];
        let config = ChainConfig::from_settings(Chain::ArbitrumSepolia, &settings(), &blocked);

        assert_eq!(config.rpc_endpoint, "https://sepolia-rollup.arbitrum.io/rpc");
        assert!(config.failover_rpc_endpoints.is_empty());
        assert_eq!(
            config.deposit_wallet_address,
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(
            config.token_contract_address.as_deref(),
            Some("0x75faf114eafb1bdbe2f0316df893fd58ce46aa4d")
        );
        assert_eq!(
            config.blocked_addresses,
            vec![address!("dead000000000000000000000000000000000000")]
        );
        assert!(config.is_blocked("0xdead000000000000000000000000000000000000".parse().unwrap()));
    }

    #[test]
    fn test_blocked_list_is_parsed_once() {
        let blocked = vec![
            "".to_string(),
            "0x1234".to_string(),
            "0x000000000000000000000000000000000000DEAD".to_string(),
        ];
        let config = ChainConfig::from_settings(Chain::ArbitrumOne, &settings(), &blocked);
        assert_eq!(
            config.blocked_addresses,
            vec![address!("000000000000000000000000000000000000dead")]
        );
        assert!(config.is_blocked(address!("000000000000000000000000000000000000dead")));
        assert!(!config.is_blocked(Address::ZERO));
    }

    #[test]
    fn test_blank_fields_are_not_configured() {
        let mut raw = settings();
        raw.token_address = "   ".to_string();
        let config = ChainConfig::from_settings(Chain::ArbitrumOne, &raw, &[]);

        assert!(config.token_contract_address.is_none());
        assert!(matches!(
            config.token_address(),
            Err(ChainError::NotConfigured { field: "token_address", .. })
        ));
        assert!(matches!(
            config.treasury_address(),
            Err(ChainError::NotConfigured { field: "treasury_wallet", .. })
        ));
        assert!(config.deposit_address().is_ok());
    }

    #[test]
    fn test_decimals_per_asset() {
        let config = ChainConfig::from_settings(Chain::ArbitrumSepolia, &settings(), &[]);
        assert_eq!(config.decimals_for(AssetKind::Token), 6);
        assert_eq!(config.decimals_for(AssetKind::Native), 18);
    }

    #[test]
    fn test_error_display() {
        let err = ChainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = ChainError::GasPriceTooHigh {
            current_gwei: 600,
            max_gwei: 500,
        };
        assert!(err.to_string().contains("600"));
    }
}
