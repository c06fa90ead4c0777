//! Incoming payment handling.
//!
//! # Data Flow
//! ```text
//! price in currency (caller)
//!     → units.rs (decimal → MinorUnits at the asset precision)
//!     → types.rs (PaymentPayload → PaymentRequest, validated once)
//!     → validator.rs (confirm the transfer on-chain)
//!     → TransferValidationResult (caller creates tickets on success)
//! ```

pub mod types;
pub mod units;
pub mod validator;

pub use types::{
    FailureReason, MatchStrategy, MatchedTransfer, Payment, PaymentError, PaymentPayload,
    PaymentRequest, TransferValidationResult, ValidationOutcome,
};
pub use units::{from_minor_units, to_minor_units, MinorUnits, UnitError};
pub use validator::TransferValidator;
