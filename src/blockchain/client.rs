//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Define the chain capability every component talks to (`ChainClient`)
//! - Implement it over JSON-RPC with failover endpoints (`RpcChainClient`)
//! - Bound every request with a timeout
//! - Provide health check for blockchain connectivity

use alloy::consensus::Transaction as _;
use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, Log, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::erc20;
use crate::blockchain::types::{ChainConfig, ChainError, ChainResult};
use crate::blockchain::wallet::DerivedSigner;
use crate::config::schema::RpcConfig;
use crate::observability::metrics;

/// A mined or pending transaction, reduced to the fields settlement needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTransaction {
    pub hash: TxHash,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub block_number: Option<u64>,
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReceipt {
    pub hash: TxHash,
    pub block_number: u64,
    /// Execution succeeded.
    pub status: bool,
    pub logs: Vec<Log>,
}

/// The chain capability used by validation and settlement.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Look up a transaction by hash.
    async fn get_transaction(&self, hash: TxHash) -> ChainResult<Option<ChainTransaction>>;

    /// Wait until `hash` is mined with at least `confirmations` blocks.
    ///
    /// Returns `Ok(None)` when the transaction is not mined within `wait`.
    async fn wait_for_receipt(
        &self,
        hash: TxHash,
        confirmations: u64,
        wait: Duration,
    ) -> ChainResult<Option<ChainReceipt>>;

    /// Latest block number.
    async fn get_block_number(&self) -> ChainResult<u64>;

    /// Current gas price in wei.
    async fn get_gas_price(&self) -> ChainResult<u128>;

    /// Gas `request` would use, including any L1 data cost of the rollup.
    async fn estimate_gas(&self, request: TransactionRequest) -> ChainResult<u64>;

    /// Native balance of `address`.
    async fn native_balance(&self, address: Address) -> ChainResult<U256>;

    /// `balanceOf(owner)` on the token contract.
    async fn token_balance(&self, token: Address, owner: Address) -> ChainResult<U256>;

    /// Sign `request` with `signer` and broadcast it.
    async fn send_transaction(
        &self,
        signer: &DerivedSigner,
        request: TransactionRequest,
    ) -> ChainResult<TxHash>;
}

/// JSON-RPC client wrapper with failover support.
#[derive(Clone)]
pub struct RpcChainClient {
    /// Primary endpoint first, failovers after it.
    urls: Vec<url::Url>,
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    chain_label: String,
    /// Request timeout duration.
    timeout_duration: Duration,
    poll_interval: Duration,
}

impl RpcChainClient {
    /// Create a client for the chain's configured endpoints.
    ///
    /// No network traffic happens here; providers connect lazily.
    pub fn connect(config: &ChainConfig, rpc: &RpcConfig) -> ChainResult<Self> {
        if config.rpc_endpoint.is_empty() {
            return Err(ChainError::NotConfigured {
                chain: config.chain,
                field: "rpc_url",
            });
        }

        let mut urls = Vec::new();

        // 1. Add primary provider
        let primary: url::Url = config.rpc_endpoint.parse().map_err(|e| {
            ChainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_endpoint, e))
        })?;
        urls.push(primary);

        // 2. Add failover providers
        for url_str in &config.failover_rpc_endpoints {
            match url_str.parse() {
                Ok(url) => urls.push(url),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        let providers = urls
            .iter()
            .map(|url| {
                Arc::new(ProviderBuilder::new().connect_http(url.clone()))
                    as Arc<dyn Provider + Send + Sync>
            })
            .collect();

        Ok(Self {
            urls,
            providers,
            chain_label: config.chain.to_string(),
            timeout_duration: Duration::from_secs(rpc.request_timeout_secs),
            poll_interval: Duration::from_millis(rpc.poll_interval_ms.max(1)),
        })
    }

    /// Check if the chain is reachable.
    ///
    /// Returns true if we can query the block number.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_rpc_health(&self.chain_label, healthy);
        healthy
    }

    async fn receipt(&self, hash: TxHash) -> ChainResult<Option<alloy::rpc::types::TransactionReceipt>> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_transaction_receipt(hash)).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(ChainError::Rpc("All providers failed to get receipt".to_string()))
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn get_transaction(&self, hash: TxHash) -> ChainResult<Option<ChainTransaction>> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_transaction_by_hash(hash)).await {
                Ok(Ok(result)) => {
                    return Ok(result.map(|tx| ChainTransaction {
                        hash,
                        from: alloy::network::TransactionResponse::from(&tx),
                        to: tx.to(),
                        value: tx.value(),
                        input: tx.input().clone(),
                        block_number: tx.block_number,
                    }))
                }
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(ChainError::Rpc("All providers failed to get transaction".to_string()))
    }

    async fn wait_for_receipt(
        &self,
        hash: TxHash,
        confirmations: u64,
        wait: Duration,
    ) -> ChainResult<Option<ChainReceipt>> {
        let mut ticker = interval(self.poll_interval);

        let result: Result<ChainResult<ChainReceipt>, _> = timeout(wait, async {
            loop {
                ticker.tick().await;

                let receipt = match self.receipt(hash).await? {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %hash, "Transaction pending");
                        continue;
                    }
                };

                let Some(block_number) = receipt.block_number() else {
                    continue;
                };

                let current_block = self.get_block_number().await?;
                let depth = (current_block + 1).saturating_sub(block_number);
                if depth >= confirmations {
                    return Ok(ChainReceipt {
                        hash,
                        block_number,
                        status: receipt.status(),
                        logs: receipt.inner.logs().iter().map(|l| l.inner.clone()).collect(),
                    });
                }

                tracing::debug!(
                    tx_hash = %hash,
                    confirmations = depth,
                    required = confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        match result {
            Ok(Ok(receipt)) => Ok(Some(receipt)),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::info!(
                    tx_hash = %hash,
                    waited_secs = wait.as_secs(),
                    "Transaction not mined before timeout"
                );
                Ok(None)
            }
        }
    }

    async fn get_block_number(&self) -> ChainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_block_number()).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(ChainError::Rpc("All providers failed to get block number".to_string()))
    }

    async fn get_gas_price(&self) -> ChainResult<u128> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_gas_price()).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(ChainError::Rpc("All providers failed to get gas price".to_string()))
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> ChainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let estimate = provider.estimate_gas(request.clone()).into_future();
            match timeout(self.timeout_duration, estimate).await {
                Ok(Ok(gas)) => return Ok(gas),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(ChainError::Rpc("All providers failed to estimate gas".to_string()))
    }

    async fn native_balance(&self, address: Address) -> ChainResult<U256> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_balance(address)).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(ChainError::Rpc("All providers failed to get balance".to_string()))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> ChainResult<U256> {
        let call = TransactionRequest::default()
            .with_to(token)
            .with_input(erc20::encode_balance_of(owner));

        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.call(call.clone()).into_future()).await {
                Ok(Ok(output)) => {
                    return erc20::decode_balance(&output).ok_or_else(|| {
                        ChainError::Rpc(format!("Malformed balanceOf response from {}", token))
                    })
                }
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(ChainError::Rpc("All providers failed to get token balance".to_string()))
    }

    async fn send_transaction(
        &self,
        signer: &DerivedSigner,
        request: TransactionRequest,
    ) -> ChainResult<TxHash> {
        // Broadcast only through the primary; resubmitting via failovers
        // could duplicate a transfer.
        let url = self.urls[0].clone();
        let provider = ProviderBuilder::new()
            .wallet(signer.wallet())
            .connect_http(url);

        let pending = timeout(self.timeout_duration, provider.send_transaction(request))
            .await
            .map_err(|_| ChainError::Timeout(self.timeout_duration.as_secs()))?
            .map_err(|e| ChainError::Rpc(format!("Broadcast failed: {}", e)))?;

        Ok(*pending.tx_hash())
    }
}

impl std::fmt::Debug for RpcChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChainClient")
            .field("chain", &self.chain_label)
            .field("rpc_url", &self.urls[0].as_str())
            .field("failovers", &(self.urls.len() - 1))
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
