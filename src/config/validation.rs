//! Configuration validation.
//!
//! # Responsibilities
//! - Report every missing required value (blank endpoint, wallet, token)
//! - Report malformed values (unparseable URLs and addresses, zero limits)
//!
//! # Design Decisions
//! - Returns all findings, not just the first
//! - Validation is a pure function the host calls once at startup;
//!   building the config or the registry never logs or fails

use std::fmt;

use alloy::primitives::Address;

use crate::blockchain::types::Chain;
use crate::config::schema::{ChainSettings, SettlementConfig};

/// A single finding of the startup validation report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required value is blank.
    Missing {
        chain: Option<Chain>,
        field: &'static str,
    },
    /// A value is present but unusable.
    Invalid {
        chain: Option<Chain>,
        field: &'static str,
        reason: String,
    },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing { field, .. } | ValidationError::Invalid { field, .. } => {
                field
            }
        }
    }

    pub fn chain(&self) -> Option<Chain> {
        match self {
            ValidationError::Missing { chain, .. } | ValidationError::Invalid { chain, .. } => {
                *chain
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Missing { chain: Some(c), field } => {
                write!(f, "{}: missing {}", c, field)
            }
            ValidationError::Missing { chain: None, field } => write!(f, "missing {}", field),
            ValidationError::Invalid {
                chain: Some(c),
                field,
                reason,
            } => write!(f, "{}: invalid {}: {}", c, field, reason),
            ValidationError::Invalid {
                chain: None,
                field,
                reason,
            } => write!(f, "invalid {}: {}", field, reason),
        }
    }
}

/// Validate the whole configuration.
pub fn validate_config(config: &SettlementConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.seed_phrase.is_empty() {
        errors.push(ValidationError::Missing {
            chain: None,
            field: "seed_phrase",
        });
    }
    if config.derivation.scan_limit == 0 {
        errors.push(invalid(None, "scan_limit", "must be greater than zero"));
    }
    if config.rpc.request_timeout_secs == 0 {
        errors.push(invalid(None, "request_timeout_secs", "must be greater than zero"));
    }
    if config.rpc.wait_timeout_secs == 0 {
        errors.push(invalid(None, "wait_timeout_secs", "must be greater than zero"));
    }
    let multiplier = config.rpc.gas_price_multiplier;
    if multiplier.is_nan() || multiplier < 1.0 {
        errors.push(invalid(None, "gas_price_multiplier", "must be at least 1.0"));
    }
    for addr in &config.native.blocked_addresses {
        if let Err(reason) = check_address(addr) {
            errors.push(invalid(None, "blocked_addresses", &reason));
        }
    }

    for chain in Chain::ALL {
        errors.extend(validate_chain(chain, config.chains.get(chain)));
    }

    errors
}

/// Validate the settings of a single chain.
pub fn validate_chain(chain: Chain, settings: &ChainSettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let chain = Some(chain);

    if settings.rpc_url.trim().is_empty() {
        errors.push(ValidationError::Missing {
            chain,
            field: "rpc_url",
        });
    } else if let Err(e) = settings.rpc_url.trim().parse::<url::Url>() {
        errors.push(invalid(chain, "rpc_url", &e.to_string()));
    }

    for url in &settings.failover_urls {
        if let Err(e) = url.trim().parse::<url::Url>() {
            errors.push(invalid(chain, "failover_urls", &format!("'{}': {}", url, e)));
        }
    }

    // A blank token address is a native-only deployment.
    let token = settings.token_address.trim();
    if !token.is_empty() {
        if let Err(reason) = check_address(token) {
            errors.push(invalid(chain, "token_address", &reason));
        }
    }

    let wallets = [
        ("deposit_wallet", &settings.deposit_wallet),
        ("treasury_wallet", &settings.treasury_wallet),
        ("payout_wallet", &settings.payout_wallet),
    ];
    for (field, value) in wallets {
        if value.trim().is_empty() {
            errors.push(ValidationError::Missing { chain, field });
        } else if let Err(reason) = check_address(value) {
            errors.push(invalid(chain, field, &reason));
        }
    }

    if settings.token_decimals > 36 {
        errors.push(invalid(chain, "token_decimals", "must be at most 36"));
    }

    errors
}

fn check_address(value: &str) -> Result<(), String> {
    value
        .trim()
        .to_ascii_lowercase()
        .parse::<Address>()
        .map(|_| ())
        .map_err(|e| format!("'{}': {}", value, e))
}

fn invalid(chain: Option<Chain>, field: &'static str, reason: &str) -> ValidationError {
    ValidationError::Invalid {
        chain,
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SeedPhrase;

    fn complete_settings() -> ChainSettings {
        ChainSettings {
            rpc_url: "https://sepolia-rollup.arbitrum.io/rpc".to_string(),
            failover_urls: Vec::new(),
            token_address: "0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d".to_string(),
            token_decimals: 6,
            deposit_wallet: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            treasury_wallet: "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string(),
            payout_wallet: "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC".to_string(),
        }
    }

    #[test]
    fn test_complete_chain_is_clean() {
        assert!(validate_chain(Chain::ArbitrumSepolia, &complete_settings()).is_empty());
    }

    #[test]
    fn test_default_config_reports_every_missing_field() {
        let errors = validate_config(&SettlementConfig::default());

        assert!(errors.contains(&ValidationError::Missing {
            chain: None,
            field: "seed_phrase"
        }));
        for chain in Chain::ALL {
            for field in [
                "rpc_url",
                "deposit_wallet",
                "treasury_wallet",
                "payout_wallet",
            ] {
                assert!(
                    errors.contains(&ValidationError::Missing {
                        chain: Some(chain),
                        field
                    }),
                    "expected {} {} to be reported",
                    chain,
                    field
                );
            }
        }
        assert_eq!(errors.len(), 9);
    }

    #[test]
    fn test_native_only_chain_is_clean() {
        let mut settings = complete_settings();
        settings.token_address = String::new();
        assert!(validate_chain(Chain::ArbitrumOne, &settings).is_empty());

        settings.token_address = "0xnot-an-address".to_string();
        let errors = validate_chain(Chain::ArbitrumOne, &settings);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field(), "token_address");
        assert!(matches!(errors[0], ValidationError::Invalid { .. }));
    }

    #[test]
    fn test_malformed_values_are_reported() {
        let mut settings = complete_settings();
        settings.rpc_url = "not a url".to_string();
        settings.payout_wallet = "0x1234".to_string();

        let errors = validate_chain(Chain::ArbitrumOne, &settings);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, ValidationError::Invalid { .. })));
        assert_eq!(errors[1].field(), "payout_wallet");
        assert_eq!(errors[1].chain(), Some(Chain::ArbitrumOne));
    }

    #[test]
    fn test_zero_limits_are_reported() {
        let mut config = SettlementConfig {
            seed_phrase: SeedPhrase::new("test test test test test test test test test test test junk"),
            ..Default::default()
        };
        config.derivation.scan_limit = 0;
        config.rpc.wait_timeout_secs = 0;

        let errors = validate_config(&config);
        let fields: Vec<_> = errors.iter().map(|e| e.field()).collect();
        assert!(fields.contains(&"scan_limit"));
        assert!(fields.contains(&"wait_timeout_secs"));
        assert!(!fields.contains(&"seed_phrase"));
    }

    #[test]
    fn test_display() {
        let err = ValidationError::Missing {
            chain: Some(Chain::ArbitrumOne),
            field: "rpc_url",
        };
        assert_eq!(err.to_string(), "arbitrum-one: missing rpc_url");
    }
}
