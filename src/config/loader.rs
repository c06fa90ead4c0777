//! Configuration loading from disk and from the environment.
//!
//! Loading only fails on syntactic problems. Missing values are left blank
//! and reported later by [`validate_config`](crate::config::validation::validate_config).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::blockchain::types::Chain;
use crate::config::schema::{SeedPhrase, SettlementConfig};

pub const ACTIVE_CHAIN_ENV: &str = "ACTIVE_CHAIN";
pub const SEED_PHRASE_ENV: &str = "WALLET_SEED_PHRASE";
pub const DEPOSIT_WALLET_ENV: &str = "DEPOSIT_WALLET_ADDRESS";
pub const TREASURY_WALLET_ENV: &str = "TREASURY_WALLET_ADDRESS";
pub const PAYOUT_WALLET_ENV: &str = "PAYOUT_WALLET_ADDRESS";
pub const BLOCKED_ADDRESSES_ENV: &str = "BLOCKED_ADDRESSES";
pub const WAIT_TIMEOUT_ENV: &str = "RPC_WAIT_TIMEOUT_SECS";
pub const SCAN_LIMIT_ENV: &str = "ADDRESS_SCAN_LIMIT";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    InvalidNumber { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{} must be a non-negative integer, got '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Environment key of a chain's RPC endpoint.
pub fn rpc_url_env(chain: Chain) -> &'static str {
    match chain {
        Chain::ArbitrumSepolia => "ARBITRUM_SEPOLIA_RPC_URL",
        Chain::ArbitrumOne => "ARBITRUM_ONE_RPC_URL",
    }
}

/// Environment key of a chain's stablecoin contract.
pub fn token_address_env(chain: Chain) -> &'static str {
    match chain {
        Chain::ArbitrumSepolia => "ARBITRUM_SEPOLIA_USDC_ADDRESS",
        Chain::ArbitrumOne => "ARBITRUM_ONE_USDC_ADDRESS",
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SettlementConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load a TOML file, then apply environment overrides on top.
pub fn load_config_with_env(path: &Path) -> Result<SettlementConfig, ConfigError> {
    let mut config = load_config(path)?;
    apply_env(&mut config, std::env::vars())?;
    Ok(config)
}

/// Build configuration from the process environment.
pub fn from_env() -> Result<SettlementConfig, ConfigError> {
    from_env_vars(std::env::vars())
}

/// Build configuration from an explicit set of key/value pairs.
pub fn from_env_vars<I>(vars: I) -> Result<SettlementConfig, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut config = SettlementConfig::default();
    apply_env(&mut config, vars)?;
    Ok(config)
}

/// Overwrite config fields with every environment key that is present.
///
/// Wallet addresses are shared by both chains.
pub fn apply_env<I>(config: &mut SettlementConfig, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: HashMap<String, String> = vars.into_iter().collect();
    let get = |key: &str| vars.get(key).map(|v| v.trim().to_string());

    if let Some(toggle) = get(ACTIVE_CHAIN_ENV) {
        config.active_chain = toggle;
    }
    if let Some(phrase) = get(SEED_PHRASE_ENV) {
        config.seed_phrase = SeedPhrase::new(phrase);
    }

    for chain in Chain::ALL {
        let settings = config.chains.get_mut(chain);
        if let Some(url) = get(rpc_url_env(chain)) {
            settings.rpc_url = url;
        }
        if let Some(token) = get(token_address_env(chain)) {
            settings.token_address = token;
        }
        if let Some(deposit) = get(DEPOSIT_WALLET_ENV) {
            settings.deposit_wallet = deposit;
        }
        if let Some(treasury) = get(TREASURY_WALLET_ENV) {
            settings.treasury_wallet = treasury;
        }
        if let Some(payout) = get(PAYOUT_WALLET_ENV) {
            settings.payout_wallet = payout;
        }
    }

    if let Some(list) = get(BLOCKED_ADDRESSES_ENV) {
        config.native.blocked_addresses = list
            .split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
    }
    if let Some(secs) = get(WAIT_TIMEOUT_ENV) {
        config.rpc.wait_timeout_secs = parse_number(WAIT_TIMEOUT_ENV, &secs)?;
    }
    if let Some(limit) = get(SCAN_LIMIT_ENV) {
        config.derivation.scan_limit = parse_number(SCAN_LIMIT_ENV, &limit)?;
    }
    if let Some(level) = get(LOG_LEVEL_ENV) {
        config.observability.log_level = level;
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_environment_yields_blank_config() {
        let config = from_env_vars(Vec::new()).unwrap();
        assert!(config.active_chain.is_empty());
        assert!(config.seed_phrase.is_empty());
        assert!(config.chains.arbitrum_one.rpc_url.is_empty());
        assert!(config.native.blocked_addresses.is_empty());
    }

    #[test]
    fn test_environment_keys_are_applied() {
        let config = from_env_vars(vars(&[
            ("ACTIVE_CHAIN", "arbitrum-one"),
            ("ARBITRUM_ONE_RPC_URL", "https://arb1.arbitrum.io/rpc"),
            ("ARBITRUM_ONE_USDC_ADDRESS", "0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
            ("DEPOSIT_WALLET_ADDRESS", "0x1111111111111111111111111111111111111111"),
            ("BLOCKED_ADDRESSES", " 0xaaaa, ,0xbbbb "),
            ("ADDRESS_SCAN_LIMIT", "25"),
            ("WALLET_SEED_PHRASE", "word word word"),
        ]))
        .unwrap();

        assert_eq!(config.active_chain, "arbitrum-one");
        assert_eq!(config.chains.arbitrum_one.rpc_url, "https://arb1.arbitrum.io/rpc");
        assert!(config.chains.arbitrum_sepolia.rpc_url.is_empty());
        assert_eq!(
            config.chains.arbitrum_sepolia.deposit_wallet,
            "0x1111111111111111111111111111111111111111"
        );
        assert_eq!(config.native.blocked_addresses, vec!["0xaaaa", "0xbbbb"]);
        assert_eq!(config.derivation.scan_limit, 25);
        assert_eq!(config.seed_phrase.expose(), "word word word");
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let result = from_env_vars(vars(&[("RPC_WAIT_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
    }

    #[test]
    fn test_parse_toml() {
        let config: SettlementConfig = toml::from_str(
            r#"
            active_chain = "arbitrum-sepolia"

            [chains.arbitrum_sepolia]
            rpc_url = "https://sepolia-rollup.arbitrum.io/rpc"
            token_address = "0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d"

            [rpc]
            wait_timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc.wait_timeout_secs, 30);
        assert_eq!(config.rpc.request_timeout_secs, 10);
        assert_eq!(config.chains.arbitrum_sepolia.token_decimals, 6);
        assert!(config.chains.arbitrum_one.rpc_url.is_empty());
    }
}
