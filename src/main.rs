//! Settlement preflight.
//!
//! Loads configuration the same way the host service does, reports every
//! problem found, and probes the active chain's RPC endpoints.
//!
//! ```text
//! SETTLEMENT_CONFIG (optional TOML file) + environment
//!     → validate_config
//!     → ChainRegistry
//!     → RPC health probe (active chain)
//! ```
//!
//! Exits non-zero when the configuration is invalid or the chain is
//! unreachable.

use std::path::PathBuf;
use std::process::ExitCode;

use lottery_settlement::blockchain::client::{ChainClient, RpcChainClient};
use lottery_settlement::blockchain::ChainRegistry;
use lottery_settlement::config::loader::{self, ConfigError};
use lottery_settlement::config::SettlementConfig;
use lottery_settlement::observability::{logging, metrics};

const CONFIG_PATH_ENV: &str = "SETTLEMENT_CONFIG";

fn load() -> Result<SettlementConfig, ConfigError> {
    match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) => loader::load_config_with_env(&PathBuf::from(path)),
        None => loader::from_env(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    tracing::info!("lottery-settlement v{} preflight", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let registry = ChainRegistry::new(&config);
    let chain = registry.active_chain();
    let chain_config = registry.config_for(chain);

    tracing::info!(
        chain = %chain,
        chain_id = chain.chain_id(),
        production = chain.is_production(),
        rpc_endpoints = 1 + chain_config.failover_rpc_endpoints.len(),
        token_configured = chain_config.token_contract_address.is_some(),
        scan_limit = registry.keys().scan_limit(),
        "Configuration loaded"
    );

    let errors = registry.validate();
    for error in &errors {
        tracing::warn!(chain = ?error.chain(), field = error.field(), "{}", error);
    }

    let client = match RpcChainClient::connect(chain_config, registry.rpc()) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(chain = %chain, error = %e, "Cannot create RPC client");
            return ExitCode::FAILURE;
        }
    };

    if !client.is_healthy().await {
        tracing::error!(chain = %chain, "RPC endpoints unreachable");
        return ExitCode::FAILURE;
    }
    match client.get_block_number().await {
        Ok(head) => tracing::info!(chain = %chain, block_number = head, "RPC reachable"),
        Err(e) => tracing::warn!(chain = %chain, error = %e, "Block number query failed"),
    }

    if errors.is_empty() {
        tracing::info!(chain = %chain, "Preflight passed");
        ExitCode::SUCCESS
    } else {
        tracing::error!(chain = %chain, problems = errors.len(), "Preflight failed");
        ExitCode::FAILURE
    }
}
