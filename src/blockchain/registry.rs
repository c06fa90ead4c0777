//! Per-chain configuration and connection registry.
//!
//! Built once at startup and shared by reference. Configs are immutable;
//! the only mutable state is the lazily filled client cache, one client
//! per chain for the process lifetime.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::blockchain::client::{ChainClient, RpcChainClient};
use crate::blockchain::types::{Chain, ChainConfig, ChainResult};
use crate::blockchain::wallet::KeyDerivation;
use crate::config::schema::{RpcConfig, SettlementConfig};
use crate::config::validation::{validate_config, ValidationError};

pub struct ChainRegistry {
    configs: HashMap<Chain, ChainConfig>,
    active: Chain,
    rpc: RpcConfig,
    keys: KeyDerivation,
    source: SettlementConfig,
    clients: DashMap<Chain, Arc<dyn ChainClient>>,
}

impl ChainRegistry {
    /// Build every chain's configuration eagerly.
    ///
    /// Never fails and never logs; see [`ChainRegistry::validate`].
    pub fn new(config: &SettlementConfig) -> Self {
        let configs = Chain::ALL
            .into_iter()
            .map(|chain| {
                let settings = config.chains.get(chain);
                (
                    chain,
                    ChainConfig::from_settings(chain, settings, &config.native.blocked_addresses),
                )
            })
            .collect();

        Self {
            configs,
            active: Chain::from_toggle(&config.active_chain),
            rpc: config.rpc.clone(),
            keys: KeyDerivation::with_scan_limit(
                config.seed_phrase.clone(),
                config.derivation.scan_limit,
            ),
            source: config.clone(),
            clients: DashMap::new(),
        }
    }

    /// Configuration of `chain`.
    pub fn config_for(&self, chain: Chain) -> &ChainConfig {
        // Every variant is inserted by `new`.
        &self.configs[&chain]
    }

    /// Chain selected by the runtime toggle.
    pub fn active_chain(&self) -> Chain {
        self.active
    }

    pub fn rpc(&self) -> &RpcConfig {
        &self.rpc
    }

    /// Signer derivation bound to the configured seed phrase.
    pub fn keys(&self) -> &KeyDerivation {
        &self.keys
    }

    /// Startup report of missing or malformed configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        validate_config(&self.source)
    }

    /// Client for `chain`, created on first use and reused afterwards.
    pub fn client(&self, chain: Chain) -> ChainResult<Arc<dyn ChainClient>> {
        if let Some(client) = self.clients.get(&chain) {
            return Ok(client.value().clone());
        }

        let client: Arc<dyn ChainClient> =
            Arc::new(RpcChainClient::connect(self.config_for(chain), &self.rpc)?);
        let entry = self.clients.entry(chain).or_insert(client);
        Ok(entry.value().clone())
    }

    /// Install a client for `chain`, replacing any cached one.
    pub fn with_client(self, chain: Chain, client: Arc<dyn ChainClient>) -> Self {
        self.clients.insert(chain, client);
        self
    }
}

impl std::fmt::Debug for ChainRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainRegistry")
            .field("active", &self.active)
            .field("chains", &self.configs.len())
            .field("connected", &self.clients.len())
            .finish()
    }
}
