//! Payment boundary and validation result types.

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::types::AssetKind;
use crate::payments::units::{MinorUnits, UnitError};

/// Raw payment payload as submitted by the purchase handler.
///
/// ```json
/// {"asset": "token", "tx_hash": "0x…", "sender": "0x…", "amount": "12.50"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "asset", rename_all = "snake_case")]
pub enum PaymentPayload {
    Token {
        tx_hash: String,
        sender: String,
        amount: String,
    },
    Native {
        tx_hash: String,
        sender: String,
        amount: String,
    },
}

/// Boundary validation errors for payment payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("invalid transaction hash '{0}'")]
    InvalidHash(String),

    #[error("invalid sender address '{0}'")]
    InvalidSender(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] UnitError),

    #[error("amount must be greater than zero")]
    ZeroAmount,
}

impl PaymentPayload {
    pub fn asset(&self) -> AssetKind {
        match self {
            PaymentPayload::Token { .. } => AssetKind::Token,
            PaymentPayload::Native { .. } => AssetKind::Native,
        }
    }

    /// Validate the payload once and convert it into a typed request.
    ///
    /// `decimals` is the precision of the payload's asset on the target
    /// chain (see [`ChainConfig::decimals_for`](crate::blockchain::ChainConfig::decimals_for)).
    pub fn into_request(self, decimals: u8) -> Result<PaymentRequest, PaymentError> {
        let asset = self.asset();
        let (tx_hash, sender, amount) = match self {
            PaymentPayload::Token {
                tx_hash,
                sender,
                amount,
            }
            | PaymentPayload::Native {
                tx_hash,
                sender,
                amount,
            } => (tx_hash, sender, amount),
        };

        let hash: TxHash = tx_hash
            .trim()
            .parse()
            .map_err(|_| PaymentError::InvalidHash(tx_hash.clone()))?;
        let sender_addr: Address = sender
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| PaymentError::InvalidSender(sender.clone()))?;
        let amount = MinorUnits::parse(amount.trim(), decimals)?;
        if amount.is_zero() {
            return Err(PaymentError::ZeroAmount);
        }

        let payment = Payment {
            tx_hash: hash,
            sender: sender_addr,
            amount,
        };
        Ok(match asset {
            AssetKind::Token => PaymentRequest::Token(payment),
            AssetKind::Native => PaymentRequest::Native(payment),
        })
    }
}

/// The transfer a caller expects to have happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    pub tx_hash: TxHash,
    pub sender: Address,
    pub amount: MinorUnits,
}

/// A validated payment, one variant per asset kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRequest {
    Token(Payment),
    Native(Payment),
}

impl PaymentRequest {
    pub fn token(tx_hash: TxHash, sender: Address, amount: MinorUnits) -> Self {
        PaymentRequest::Token(Payment {
            tx_hash,
            sender,
            amount,
        })
    }

    pub fn native(tx_hash: TxHash, sender: Address, amount: MinorUnits) -> Self {
        PaymentRequest::Native(Payment {
            tx_hash,
            sender,
            amount,
        })
    }

    pub fn asset(&self) -> AssetKind {
        match self {
            PaymentRequest::Token(_) => AssetKind::Token,
            PaymentRequest::Native(_) => AssetKind::Native,
        }
    }

    pub fn payment(&self) -> &Payment {
        match self {
            PaymentRequest::Token(p) | PaymentRequest::Native(p) => p,
        }
    }
}

/// Why a transfer failed validation. `Display` is the user-facing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("Payment validation is not configured for this network")]
    NotConfigured,

    #[error("Transaction not found or not yet mined")]
    TransactionNotFound,

    #[error("Transaction failed on-chain")]
    TransactionReverted,

    #[error("No matching transfer to the deposit wallet found in transaction")]
    NoMatchingTransfer,

    #[error("Amount mismatch: expected {expected}, received {actual}")]
    AmountMismatch { expected: U256, actual: U256 },

    #[error("Insufficient confirmations ({confirmations}), try again shortly")]
    InsufficientConfirmations { confirmations: u64 },
}

impl FailureReason {
    /// Stable label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            FailureReason::NotConfigured => "not_configured",
            FailureReason::TransactionNotFound => "transaction_not_found",
            FailureReason::TransactionReverted => "transaction_reverted",
            FailureReason::NoMatchingTransfer => "no_matching_transfer",
            FailureReason::AmountMismatch { .. } => "amount_mismatch",
            FailureReason::InsufficientConfirmations { .. } => "insufficient_confirmations",
        }
    }

    /// Whether validating the same hash later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FailureReason::TransactionNotFound | FailureReason::InsufficientConfirmations { .. }
        )
    }
}

/// Which strategy located the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Decoded `Transfer` event emitted by the token contract.
    EventLog,
    /// Decoded `transfer(address,uint256)` call data.
    CallData,
    /// The transaction's own value field.
    NativeValue,
}

/// A transfer that satisfied every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedTransfer {
    pub confirmations: u64,
    pub amount: U256,
    pub sender: Address,
    pub recipient: Address,
    pub strategy: MatchStrategy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Success(MatchedTransfer),
    Failure { reason: FailureReason },
}

/// Result of one validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferValidationResult {
    pub transaction_hash: TxHash,
    #[serde(flatten)]
    pub outcome: ValidationOutcome,
}

impl TransferValidationResult {
    pub fn success(transaction_hash: TxHash, matched: MatchedTransfer) -> Self {
        Self {
            transaction_hash,
            outcome: ValidationOutcome::Success(matched),
        }
    }

    pub fn failure(transaction_hash: TxHash, reason: FailureReason) -> Self {
        Self {
            transaction_hash,
            outcome: ValidationOutcome::Failure { reason },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ValidationOutcome::Success(_))
    }

    pub fn matched(&self) -> Option<&MatchedTransfer> {
        match &self.outcome {
            ValidationOutcome::Success(m) => Some(m),
            ValidationOutcome::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match &self.outcome {
            ValidationOutcome::Success(_) => None,
            ValidationOutcome::Failure { reason } => Some(reason),
        }
    }

    /// Zero for failures.
    pub fn confirmation_count(&self) -> u64 {
        self.matched().map(|m| m.confirmations).unwrap_or(0)
    }
}
