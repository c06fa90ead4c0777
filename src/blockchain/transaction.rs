//! Outgoing transfer building.
//!
//! # Responsibilities
//! - Build native value transfers and ERC-20 `transfer` calls
//! - Price gas with a safety multiplier
//! - Size the gas limit from the node's estimate
//! - Refuse to broadcast during gas price spikes
//!
//! Arbitrum charges the L1 data cost through the gas limit, so even a plain
//! value transfer needs more than 21000 gas. Limits always come from
//! `eth_estimateGas`.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;

use crate::blockchain::client::ChainClient;
use crate::blockchain::erc20;
use crate::blockchain::types::{ChainError, ChainResult};
use crate::config::schema::RpcConfig;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// What an outgoing transfer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutgoingTransfer {
    /// Native value sent directly to `to`.
    Native { to: Address, value: U256 },
    /// `transfer(to, amount)` on the token contract.
    Token {
        contract: Address,
        to: Address,
        amount: U256,
    },
}

impl OutgoingTransfer {
    pub fn recipient(&self) -> Address {
        match self {
            OutgoingTransfer::Native { to, .. } | OutgoingTransfer::Token { to, .. } => *to,
        }
    }

    pub fn amount(&self) -> U256 {
        match self {
            OutgoingTransfer::Native { value, .. } => *value,
            OutgoingTransfer::Token { amount, .. } => *amount,
        }
    }

    /// Unpriced request sending this transfer from `from`.
    fn request(&self, from: Address) -> TransactionRequest {
        let request = TransactionRequest::default().with_from(from);
        match *self {
            OutgoingTransfer::Native { to, value } => request.with_to(to).with_value(value),
            OutgoingTransfer::Token {
                contract,
                to,
                amount,
            } => request
                .with_to(contract)
                .with_input(erc20::encode_transfer(to, amount)),
        }
    }
}

/// Gas price and gas limit of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasQuote {
    /// Wei per gas, multiplier applied.
    pub gas_price: u128,
    pub gas_limit: u64,
}

impl GasQuote {
    /// Most the transfer can be charged.
    pub fn max_fee(&self) -> U256 {
        U256::from(self.gas_price) * U256::from(self.gas_limit)
    }
}

/// Builds transaction requests with guarded gas pricing.
pub struct TransferBuilder<'a> {
    client: &'a dyn ChainClient,
    gas_price_multiplier: f64,
    max_gas_price_gwei: u64,
}

impl<'a> TransferBuilder<'a> {
    pub fn new(client: &'a dyn ChainClient, rpc: &RpcConfig) -> Self {
        Self {
            client,
            gas_price_multiplier: rpc.gas_price_multiplier,
            max_gas_price_gwei: rpc.max_gas_price_gwei,
        }
    }

    /// Current gas price with the safety multiplier applied.
    ///
    /// Fails with [`ChainError::GasPriceTooHigh`] above the configured cap.
    pub async fn gas_price(&self) -> ChainResult<u128> {
        let gas_price = self.client.get_gas_price().await?;
        let gas_price_gwei = gas_price / WEI_PER_GWEI;

        if gas_price_gwei > self.max_gas_price_gwei as u128 {
            return Err(ChainError::GasPriceTooHigh {
                current_gwei: gas_price_gwei as u64,
                max_gwei: self.max_gas_price_gwei,
            });
        }

        Ok((gas_price as f64 * self.gas_price_multiplier) as u128)
    }

    /// Price `transfer` sent from `from`.
    ///
    /// The estimate runs without gas price fields so a native transfer of
    /// the whole balance can be sized before its fee is deducted.
    pub async fn quote(&self, from: Address, transfer: OutgoingTransfer) -> ChainResult<GasQuote> {
        let gas_price = self.gas_price().await?;
        let gas_limit = self.client.estimate_gas(transfer.request(from)).await?;
        Ok(GasQuote {
            gas_price,
            gas_limit,
        })
    }

    /// Build the priced request for `transfer` sent from `from`.
    ///
    /// The nonce is filled by the provider.
    pub fn build(from: Address, transfer: OutgoingTransfer, quote: GasQuote) -> TransactionRequest {
        transfer
            .request(from)
            .with_gas_price(quote.gas_price)
            .with_gas_limit(quote.gas_limit)
    }
}
