//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment variables / TOML file
//!     → loader.rs (parse & deserialize, blanks allowed)
//!     → SettlementConfig (immutable)
//!     → validation.rs (explicit startup report)
//!     → ChainRegistry (one ChainConfig per chain)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Missing values never fail loading; they are reported by validation

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{ChainSettings, SeedPhrase, SettlementConfig, DEFAULT_SCAN_LIMIT};
pub use validation::{validate_config, ValidationError};
