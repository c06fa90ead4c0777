//! Deterministic signer derivation from the configured seed phrase.
//!
//! # Security
//! - The seed phrase comes only from configuration and is never logged
//! - Derived signers live for one operation and are never cached
//! - Only addresses are written to logs

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use alloy::signers::Signer;

use crate::blockchain::types::{Chain, ChainError, ChainResult};
use crate::config::schema::{SeedPhrase, DEFAULT_SCAN_LIMIT};

/// Derivation path for an account index (BIP-44, Ethereum coin type).
pub fn derivation_path(account_index: u32) -> String {
    format!("m/44'/60'/0'/0/{}", account_index)
}

/// A signing identity bound to one `(chain, account_index)` pair.
pub struct DerivedSigner {
    signer: PrivateKeySigner,
    chain: Chain,
    account_index: u32,
}

impl DerivedSigner {
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn account_index(&self) -> u32 {
        self.account_index
    }

    /// Wallet wrapper used by wallet-backed providers to sign transactions.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for DerivedSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedSigner")
            .field("address", &self.address())
            .field("chain", &self.chain)
            .field("account_index", &self.account_index)
            .finish()
    }
}

/// Derives signers from the seed phrase by account index.
#[derive(Clone)]
pub struct KeyDerivation {
    seed_phrase: SeedPhrase,
    scan_limit: u32,
}

impl KeyDerivation {
    /// Create a derivation source scanning the default index range.
    pub fn new(seed_phrase: SeedPhrase) -> Self {
        Self::with_scan_limit(seed_phrase, DEFAULT_SCAN_LIMIT)
    }

    pub fn with_scan_limit(seed_phrase: SeedPhrase, scan_limit: u32) -> Self {
        Self {
            seed_phrase,
            scan_limit,
        }
    }

    /// Number of account indices `resolve_signer_for` inspects.
    pub fn scan_limit(&self) -> u32 {
        self.scan_limit
    }

    /// Derive the signer at `account_index`.
    pub fn signer_at(&self, chain: Chain, account_index: u32) -> ChainResult<DerivedSigner> {
        if self.seed_phrase.is_empty() {
            return Err(ChainError::Configuration(
                "no seed phrase configured".to_string(),
            ));
        }

        let signer = MnemonicBuilder::<English>::default()
            .phrase(self.seed_phrase.expose())
            .derivation_path(derivation_path(account_index))
            .map_err(|e| ChainError::Signer(format!("Invalid derivation path: {}", e)))?
            .build()
            .map_err(|e| ChainError::Signer(format!("Derivation failed: {}", e)))?
            .with_chain_id(Some(chain.chain_id()));

        Ok(DerivedSigner {
            signer,
            chain,
            account_index,
        })
    }

    /// Find the signer whose address equals `target`.
    ///
    /// Only indices `0..scan_limit` are inspected, so lookups have a hard
    /// latency ceiling; wallets outside that range are reported as
    /// [`ChainError::AddressNotDerivable`].
    pub fn resolve_signer_for(&self, chain: Chain, target: Address) -> ChainResult<DerivedSigner> {
        for index in 0..self.scan_limit {
            let signer = self.signer_at(chain, index)?;
            if signer.address() == target {
                tracing::debug!(
                    chain = %chain,
                    address = %target,
                    account_index = index,
                    "Resolved signer"
                );
                return Ok(signer);
            }
        }

        Err(ChainError::AddressNotDerivable {
            address: target,
            scanned: self.scan_limit,
        })
    }
}

impl std::fmt::Debug for KeyDerivation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyDerivation")
            .field("seed_phrase", &self.seed_phrase)
            .field("scan_limit", &self.scan_limit)
            .finish()
    }
}
