//! Incoming transfer validation.
//!
//! # Flow
//! ```text
//! configuration check
//!     → wait for receipt (bounded)      ─ timeout ─▶ TransactionNotFound
//!     → status check                    ─ failed ──▶ TransactionReverted
//!     → match transfer
//!         token:  Transfer event logs, then raw transfer() call data
//!         native: transaction to / from / value
//!                                       ─ none ────▶ NoMatchingTransfer
//!     → exact amount check              ─ differs ─▶ AmountMismatch
//!     → confirmation count              ─ < 1 ─────▶ InsufficientConfirmations
//!     → Success
//! ```
//!
//! Expected failures are returned inside [`TransferValidationResult`];
//! only transport errors surface as `Err`. No retries happen here and no
//! record of consumed hashes is kept, so repeated calls for the same hash
//! return the same outcome.

use alloy::primitives::{Address, TxHash, U256};
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::client::{ChainClient, ChainReceipt};
use crate::blockchain::erc20;
use crate::blockchain::registry::ChainRegistry;
use crate::blockchain::types::{AssetKind, Chain, ChainConfig, ChainError, ChainResult};
use crate::observability::metrics;
use crate::payments::types::{
    FailureReason, MatchStrategy, MatchedTransfer, Payment, PaymentRequest,
    TransferValidationResult,
};

/// A transfer located in a transaction, before amount checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CandidateTransfer {
    sender: Address,
    recipient: Address,
    amount: U256,
    strategy: MatchStrategy,
}

/// Confirms that an expected payment actually happened on-chain.
#[derive(Clone)]
pub struct TransferValidator {
    registry: Arc<ChainRegistry>,
}

impl TransferValidator {
    pub fn new(registry: Arc<ChainRegistry>) -> Self {
        Self { registry }
    }

    /// Validate `request` against the chain state of `chain`.
    pub async fn validate(
        &self,
        chain: Chain,
        request: &PaymentRequest,
    ) -> ChainResult<TransferValidationResult> {
        let payment = request.payment();
        let result = self.run(chain, request.asset(), payment).await?;

        match result.failure_reason() {
            None => tracing::info!(
                chain = %chain,
                tx_hash = %payment.tx_hash,
                sender = %payment.sender,
                amount = %payment.amount,
                confirmations = result.confirmation_count(),
                "Payment validated"
            ),
            Some(reason) => tracing::warn!(
                chain = %chain,
                tx_hash = %payment.tx_hash,
                sender = %payment.sender,
                reason = reason.label(),
                "Payment rejected"
            ),
        }
        metrics::record_validation(
            &chain.to_string(),
            result.failure_reason().map(|r| r.label()).unwrap_or("success"),
        );

        Ok(result)
    }

    async fn run(
        &self,
        chain: Chain,
        asset: AssetKind,
        payment: &Payment,
    ) -> ChainResult<TransferValidationResult> {
        let hash = payment.tx_hash;
        let fail = |reason| Ok(TransferValidationResult::failure(hash, reason));
        let config = self.registry.config_for(chain);

        // 1. Configuration
        let expected_decimals = config.decimals_for(asset);
        if payment.amount.decimals() != expected_decimals {
            return Err(ChainError::PrecisionMismatch {
                expected: expected_decimals,
                actual: payment.amount.decimals(),
            });
        }
        let Some(setup) = Setup::resolve(config, asset) else {
            return fail(FailureReason::NotConfigured);
        };
        let client = match self.registry.client(chain) {
            Ok(client) => client,
            Err(ChainError::NotConfigured { .. }) => return fail(FailureReason::NotConfigured),
            Err(e) => return Err(e),
        };

        // 2. Bounded wait for the transaction to be mined
        let wait = Duration::from_secs(self.registry.rpc().wait_timeout_secs);
        let Some(receipt) = client.wait_for_receipt(hash, 1, wait).await? else {
            return fail(FailureReason::TransactionNotFound);
        };

        // 3. Execution status
        if !receipt.status {
            return fail(FailureReason::TransactionReverted);
        }

        // 4. Locate the transfer
        let candidate = match setup {
            Setup::Token { token, deposit } => {
                match_token_transfer(client.as_ref(), &receipt, token, deposit, payment.sender)
                    .await?
            }
            Setup::Native { deposit } => {
                match_native_transfer(client.as_ref(), config, hash, deposit, payment.sender)
                    .await?
            }
        };

        // 5. Nothing matched
        let Some(candidate) = candidate else {
            return fail(FailureReason::NoMatchingTransfer);
        };

        // 6. Exact amount, no tolerance
        let expected = payment.amount.value();
        if candidate.amount != expected {
            return fail(FailureReason::AmountMismatch {
                expected,
                actual: candidate.amount,
            });
        }

        // 7. Confirmations, inclusive of the transaction's own block
        let head = client.get_block_number().await?;
        let confirmations = head.saturating_add(1).saturating_sub(receipt.block_number);
        if confirmations < 1 {
            return fail(FailureReason::InsufficientConfirmations { confirmations });
        }

        // 8. Success
        Ok(TransferValidationResult::success(
            hash,
            MatchedTransfer {
                confirmations,
                amount: candidate.amount,
                sender: candidate.sender,
                recipient: candidate.recipient,
                strategy: candidate.strategy,
            },
        ))
    }
}

/// Addresses needed for one asset kind, present only when configured.
enum Setup {
    Token { token: Address, deposit: Address },
    Native { deposit: Address },
}

impl Setup {
    fn resolve(config: &ChainConfig, asset: AssetKind) -> Option<Self> {
        let deposit = config.deposit_address().ok()?;
        match asset {
            AssetKind::Token => Some(Setup::Token {
                token: config.token_address().ok()?,
                deposit,
            }),
            AssetKind::Native => Some(Setup::Native { deposit }),
        }
    }
}

/// Event logs first, raw call data second. The first strategy that finds
/// a matching transfer wins.
async fn match_token_transfer(
    client: &dyn ChainClient,
    receipt: &ChainReceipt,
    token: Address,
    deposit: Address,
    sender: Address,
) -> ChainResult<Option<CandidateTransfer>> {
    let from_logs = receipt
        .logs
        .iter()
        .filter(|log| log.address == token)
        .filter_map(erc20::decode_transfer_log)
        .find(|t| t.to == deposit && t.from == sender)
        .map(|t| CandidateTransfer {
            sender: t.from,
            recipient: t.to,
            amount: t.value,
            strategy: MatchStrategy::EventLog,
        });

    let tx = match client.get_transaction(receipt.hash).await {
        Ok(Some(tx)) => tx,
        Ok(None) => return Ok(from_logs),
        Err(e) if from_logs.is_some() => {
            tracing::debug!(tx_hash = %receipt.hash, error = %e, "Skipping call data cross-check");
            return Ok(from_logs);
        }
        Err(e) => return Err(e),
    };
    let from_call = (tx.to == Some(token))
        .then(|| erc20::decode_transfer_call(&tx.input))
        .flatten()
        .filter(|(recipient, _)| *recipient == deposit && tx.from == sender)
        .map(|(recipient, amount)| CandidateTransfer {
            sender: tx.from,
            recipient,
            amount,
            strategy: MatchStrategy::CallData,
        });

    match (from_logs, from_call) {
        (Some(log), Some(call)) if log.amount != call.amount => {
            // Unresolved ambiguity (e.g. proxy contracts): the event wins.
            tracing::warn!(
                tx_hash = %receipt.hash,
                log_amount = %log.amount,
                call_amount = %call.amount,
                "Transfer event and call data disagree"
            );
            Ok(Some(log))
        }
        (Some(log), _) => Ok(Some(log)),
        (None, call) => Ok(call),
    }
}

/// The transaction's own destination, origin and value are the transfer.
async fn match_native_transfer(
    client: &dyn ChainClient,
    config: &ChainConfig,
    hash: TxHash,
    deposit: Address,
    sender: Address,
) -> ChainResult<Option<CandidateTransfer>> {
    let Some(tx) = client.get_transaction(hash).await? else {
        return Ok(None);
    };
    let Some(to) = tx.to else {
        return Ok(None);
    };

    if config.is_blocked(to) {
        tracing::warn!(tx_hash = %hash, destination = %to, "Payment sent to a blocked address");
        return Ok(None);
    }
    if to != deposit || tx.from != sender {
        return Ok(None);
    }

    Ok(Some(CandidateTransfer {
        sender: tx.from,
        recipient: to,
        amount: tx.value,
        strategy: MatchStrategy::NativeValue,
    }))
}
