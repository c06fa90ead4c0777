//! Outgoing transfers: sweeping wallets into the payout wallet and paying
//! winners.
//!
//! Both operations are single-shot. Transfers are not idempotent, so a
//! caller retrying after an error must first check whether the earlier
//! attempt landed (balance or recorded hash). Concurrent calls that spend
//! from the same wallet must be serialized by the caller.

use alloy::primitives::{Address, TxHash};
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::client::ChainClient;
use crate::blockchain::registry::ChainRegistry;
use crate::blockchain::transaction::{GasQuote, OutgoingTransfer, TransferBuilder};
use crate::blockchain::types::{AssetKind, Chain, ChainError};
use crate::blockchain::wallet::DerivedSigner;
use crate::observability::metrics;
use crate::payments::units::MinorUnits;
use crate::settlement::{SettlementError, SettlementResult};

/// Which outgoing operation a transfer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Sweep,
    Payout,
}

impl Operation {
    fn label(&self) -> &'static str {
        match self {
            Operation::Sweep => "sweep",
            Operation::Payout => "payout",
        }
    }

    fn failed(&self, chain: Chain, tx_hash: TxHash) -> SettlementError {
        match self {
            Operation::Sweep => SettlementError::SweepFailed { chain, tx_hash },
            Operation::Payout => SettlementError::PayoutFailed { chain, tx_hash },
        }
    }
}

/// Executes sweeps and payouts with derived signers.
#[derive(Clone)]
pub struct SettlementExecutor {
    registry: Arc<ChainRegistry>,
}

impl SettlementExecutor {
    pub fn new(registry: Arc<ChainRegistry>) -> Self {
        Self { registry }
    }

    /// Move the whole `asset` balance of `from` to the chain's payout wallet.
    ///
    /// Returns `Ok(None)` without broadcasting when there is nothing to move.
    /// Native sweeps keep back the maximum fee of the transfer itself.
    pub async fn sweep(
        &self,
        chain: Chain,
        asset: AssetKind,
        from: Address,
    ) -> SettlementResult<Option<TxHash>> {
        let config = self.registry.config_for(chain);
        let destination = config.payout_address()?;
        let client = self.registry.client(chain)?;
        let builder = TransferBuilder::new(client.as_ref(), self.registry.rpc());

        let (transfer, quote) = match asset {
            AssetKind::Token => {
                let token = config.token_address()?;
                let balance = client.token_balance(token, from).await?;
                if balance.is_zero() {
                    tracing::info!(chain = %chain, address = %from, "Nothing to sweep");
                    return Ok(None);
                }
                let transfer = OutgoingTransfer::Token {
                    contract: token,
                    to: destination,
                    amount: balance,
                };
                (transfer, builder.quote(from, transfer).await?)
            }
            AssetKind::Native => {
                let balance = client.native_balance(from).await?;
                if balance.is_zero() {
                    tracing::info!(chain = %chain, address = %from, "Nothing to sweep");
                    return Ok(None);
                }
                let full = OutgoingTransfer::Native {
                    to: destination,
                    value: balance,
                };
                let quote = builder.quote(from, full).await?;
                let fee = quote.max_fee();
                if balance <= fee {
                    tracing::info!(
                        chain = %chain,
                        address = %from,
                        balance = %balance,
                        fee = %fee,
                        "Balance does not cover the sweep fee"
                    );
                    return Ok(None);
                }
                let transfer = OutgoingTransfer::Native {
                    to: destination,
                    value: balance - fee,
                };
                (transfer, quote)
            }
        };

        let signer = self.registry.keys().resolve_signer_for(chain, from)?;
        let tx_hash = self
            .execute(chain, Operation::Sweep, client.as_ref(), &signer, transfer, quote)
            .await?;
        Ok(Some(tx_hash))
    }

    /// Pay `amount` of `asset` from the chain's payout wallet to `recipient`.
    pub async fn payout(
        &self,
        chain: Chain,
        asset: AssetKind,
        recipient: Address,
        amount: MinorUnits,
    ) -> SettlementResult<TxHash> {
        let config = self.registry.config_for(chain);
        let expected = config.decimals_for(asset);
        if amount.decimals() != expected {
            return Err(ChainError::PrecisionMismatch {
                expected,
                actual: amount.decimals(),
            }
            .into());
        }
        if amount.is_zero() {
            return Err(SettlementError::ZeroAmount);
        }

        let payout_wallet = config.payout_address()?;
        let client = self.registry.client(chain)?;
        let builder = TransferBuilder::new(client.as_ref(), self.registry.rpc());

        let transfer = match asset {
            AssetKind::Token => OutgoingTransfer::Token {
                contract: config.token_address()?,
                to: recipient,
                amount: amount.value(),
            },
            AssetKind::Native => OutgoingTransfer::Native {
                to: recipient,
                value: amount.value(),
            },
        };

        let signer = self.registry.keys().resolve_signer_for(chain, payout_wallet)?;
        let quote = builder.quote(payout_wallet, transfer).await?;
        self.execute(chain, Operation::Payout, client.as_ref(), &signer, transfer, quote)
            .await
    }

    /// Broadcast, wait for one confirmation and check the status.
    async fn execute(
        &self,
        chain: Chain,
        operation: Operation,
        client: &dyn ChainClient,
        signer: &DerivedSigner,
        transfer: OutgoingTransfer,
        quote: GasQuote,
    ) -> SettlementResult<TxHash> {
        let request = TransferBuilder::build(signer.address(), transfer, quote);
        let tx_hash = client.send_transaction(signer, request).await?;

        tracing::info!(
            chain = %chain,
            operation = operation.label(),
            from = %signer.address(),
            to = %transfer.recipient(),
            amount = %transfer.amount(),
            gas_limit = quote.gas_limit,
            tx_hash = %tx_hash,
            "Transfer broadcast"
        );

        let wait = Duration::from_secs(self.registry.rpc().wait_timeout_secs);
        let receipt = client.wait_for_receipt(tx_hash, 1, wait).await?;

        match receipt {
            Some(r) if r.status => {
                metrics::record_transfer(&chain.to_string(), operation.label(), "success");
                tracing::info!(
                    chain = %chain,
                    operation = operation.label(),
                    tx_hash = %tx_hash,
                    block_number = r.block_number,
                    "Transfer confirmed"
                );
                Ok(tx_hash)
            }
            Some(_) => {
                metrics::record_transfer(&chain.to_string(), operation.label(), "failed");
                tracing::error!(
                    chain = %chain,
                    operation = operation.label(),
                    tx_hash = %tx_hash,
                    "Transfer reverted"
                );
                Err(operation.failed(chain, tx_hash))
            }
            None => {
                metrics::record_transfer(&chain.to_string(), operation.label(), "unconfirmed");
                tracing::error!(
                    chain = %chain,
                    operation = operation.label(),
                    tx_hash = %tx_hash,
                    "Transfer not confirmed in time"
                );
                Err(SettlementError::Unconfirmed { chain, tx_hash })
            }
        }
    }
}
