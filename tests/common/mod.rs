//! Shared fixtures for integration tests: an in-memory chain and a
//! registry wired to it.

#![allow(dead_code)]

use alloy::primitives::{address, keccak256, Address, Bytes, Log, TxHash, B256, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lottery_settlement::blockchain::client::{ChainClient, ChainReceipt, ChainTransaction};
use lottery_settlement::blockchain::erc20;
use lottery_settlement::blockchain::wallet::DerivedSigner;
use lottery_settlement::blockchain::{Chain, ChainError, ChainRegistry, ChainResult};
use lottery_settlement::config::loader::from_env_vars;
use lottery_settlement::config::SettlementConfig;

pub const MNEMONIC: &str = "test test test test test test test test test test test junk";

/// Index 0: a customer paying for tickets.
pub const CUSTOMER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
/// Index 1: payout wallet.
pub const PAYOUT: Address = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");
/// Index 2: deposit wallet.
pub const DEPOSIT: Address = address!("3c44cdddb6a900fa2b585dd299e03d12fa4293bc");
/// Index 3: treasury wallet.
pub const TREASURY: Address = address!("90f79bf6eb2c4f870365e785982e1f101e93b906");

pub const TOKEN: Address = address!("75faf114eafb1bdbe2f0316df893fd58ce46aa4d");
pub const BLOCKED: Address = address!("000000000000000000000000000000000000dead");
pub const STRANGER: Address = address!("1111111111111111111111111111111111111111");

pub const CHAIN: Chain = Chain::ArbitrumSepolia;

/// Environment of a fully configured testnet deployment.
pub fn env() -> Vec<(String, String)> {
    [
        ("ACTIVE_CHAIN", "testnet"),
        ("WALLET_SEED_PHRASE", MNEMONIC),
        ("ARBITRUM_SEPOLIA_RPC_URL", "http://127.0.0.1:1"),
        ("ARBITRUM_SEPOLIA_USDC_ADDRESS", "0x75faf114eafb1bdbe2f0316df893fd58ce46aa4d"),
        ("DEPOSIT_WALLET_ADDRESS", "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"),
        ("TREASURY_WALLET_ADDRESS", "0x90f79bf6eb2c4f870365e785982e1f101e93b906"),
        ("PAYOUT_WALLET_ADDRESS", "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"),
        ("BLOCKED_ADDRESSES", "0x000000000000000000000000000000000000dEaD"),
        ("RPC_WAIT_TIMEOUT_SECS", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn config() -> SettlementConfig {
    from_env_vars(env()).unwrap()
}

/// Registry whose testnet client is `chain`.
pub fn registry_with(config: &SettlementConfig, chain: Arc<MockChainClient>) -> Arc<ChainRegistry> {
    Arc::new(ChainRegistry::new(config).with_client(CHAIN, chain))
}

pub fn tx_hash(n: u8) -> TxHash {
    B256::with_last_byte(n)
}

/// A `Transfer(from, to, value)` event emitted by `token`.
pub fn transfer_log(token: Address, from: Address, to: Address, value: U256) -> Log {
    let signature = keccak256("Transfer(address,address,uint256)");
    Log::new_unchecked(
        token,
        vec![signature, from.into_word(), to.into_word()],
        Bytes::from(value.to_be_bytes::<32>().to_vec()),
    )
}

/// A broadcast transfer recorded by the mock.
#[derive(Debug, Clone)]
pub struct SentTransaction {
    pub hash: TxHash,
    pub signer: Address,
    pub account_index: u32,
    pub request: TransactionRequest,
}

impl SentTransaction {
    pub fn to(&self) -> Option<Address> {
        self.request.to.and_then(|kind| kind.to().copied())
    }

    pub fn value(&self) -> U256 {
        self.request.value.unwrap_or_default()
    }

    /// Decoded `(recipient, amount)` of a token transfer.
    pub fn token_transfer(&self) -> Option<(Address, U256)> {
        let input = self.request.input.input()?;
        erc20::decode_transfer_call(input)
    }
}

#[derive(Default)]
struct State {
    transactions: HashMap<TxHash, ChainTransaction>,
    receipts: HashMap<TxHash, ChainReceipt>,
    block_number: u64,
    gas_price: u128,
    gas_estimate: u64,
    native_balances: HashMap<Address, U256>,
    token_balances: HashMap<(Address, Address), U256>,
    sent: Vec<SentTransaction>,
    revert_sent: bool,
    drop_sent: bool,
    unreachable: bool,
}

/// In-memory chain. Sent transactions are mined in the current block.
pub struct MockChainClient {
    state: Mutex<State>,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                block_number: 100,
                gas_price: 100_000_000,
                // Arbitrum-like: above 21000 because of the L1 data cost.
                gas_estimate: 96_000,
                ..Default::default()
            }),
        }
    }

    pub fn set_block_number(&self, block: u64) {
        self.state.lock().unwrap().block_number = block;
    }

    pub fn set_gas_price(&self, wei: u128) {
        self.state.lock().unwrap().gas_price = wei;
    }

    pub fn set_gas_estimate(&self, gas: u64) {
        self.state.lock().unwrap().gas_estimate = gas;
    }

    pub fn set_native_balance(&self, owner: Address, balance: U256) {
        self.state.lock().unwrap().native_balances.insert(owner, balance);
    }

    pub fn set_token_balance(&self, token: Address, owner: Address, balance: U256) {
        self.state
            .lock()
            .unwrap()
            .token_balances
            .insert((token, owner), balance);
    }

    /// Broadcast transactions are mined but reverted.
    pub fn revert_sent(&self) {
        self.state.lock().unwrap().revert_sent = true;
    }

    /// Broadcast transactions are never mined.
    pub fn drop_sent(&self) {
        self.state.lock().unwrap().drop_sent = true;
    }

    /// Every request fails with a transport error.
    pub fn go_offline(&self) {
        self.state.lock().unwrap().unreachable = true;
    }

    /// Add a transaction without a receipt.
    pub fn add_pending(&self, tx: ChainTransaction) {
        self.state.lock().unwrap().transactions.insert(tx.hash, tx);
    }

    /// Add a transaction mined in `block`.
    pub fn add_mined(&self, tx: ChainTransaction, block: u64, status: bool, logs: Vec<Log>) {
        let mut state = self.state.lock().unwrap();
        state.receipts.insert(
            tx.hash,
            ChainReceipt {
                hash: tx.hash,
                block_number: block,
                status,
                logs,
            },
        );
        state.transactions.insert(
            tx.hash,
            ChainTransaction {
                block_number: Some(block),
                ..tx
            },
        );
    }

    /// Add a successful `transfer(to, amount)` call on `token` from `from`,
    /// with the matching event log.
    pub fn add_token_payment(&self, hash: TxHash, from: Address, to: Address, amount: U256, block: u64) {
        let tx = ChainTransaction {
            hash,
            from,
            to: Some(TOKEN),
            value: U256::ZERO,
            input: erc20::encode_transfer(to, amount),
            block_number: None,
        };
        self.add_mined(tx, block, true, vec![transfer_log(TOKEN, from, to, amount)]);
    }

    /// Add a successful native value transfer.
    pub fn add_native_payment(&self, hash: TxHash, from: Address, to: Address, value: U256, block: u64) {
        let tx = ChainTransaction {
            hash,
            from,
            to: Some(to),
            value,
            input: Bytes::new(),
            block_number: None,
        };
        self.add_mined(tx, block, true, Vec::new());
    }

    pub fn sent(&self) -> Vec<SentTransaction> {
        self.state.lock().unwrap().sent.clone()
    }

    fn check_online(&self) -> ChainResult<()> {
        if self.state.lock().unwrap().unreachable {
            return Err(ChainError::Rpc("All providers failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn get_transaction(&self, hash: TxHash) -> ChainResult<Option<ChainTransaction>> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().transactions.get(&hash).cloned())
    }

    async fn wait_for_receipt(
        &self,
        hash: TxHash,
        _confirmations: u64,
        _wait: Duration,
    ) -> ChainResult<Option<ChainReceipt>> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().receipts.get(&hash).cloned())
    }

    async fn get_block_number(&self) -> ChainResult<u64> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().block_number)
    }

    async fn get_gas_price(&self) -> ChainResult<u128> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().gas_price)
    }

    async fn estimate_gas(&self, _request: TransactionRequest) -> ChainResult<u64> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().gas_estimate)
    }

    async fn native_balance(&self, address: Address) -> ChainResult<U256> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .native_balances
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn token_balance(&self, token: Address, owner: Address) -> ChainResult<U256> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .token_balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn send_transaction(
        &self,
        signer: &DerivedSigner,
        request: TransactionRequest,
    ) -> ChainResult<TxHash> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let hash = B256::with_last_byte(0xf0u8.wrapping_add(state.sent.len() as u8));
        state.sent.push(SentTransaction {
            hash,
            signer: signer.address(),
            account_index: signer.account_index(),
            request,
        });
        if !state.drop_sent {
            let block = state.block_number;
            let status = !state.revert_sent;
            state.receipts.insert(
                hash,
                ChainReceipt {
                    hash,
                    block_number: block,
                    status,
                    logs: Vec::new(),
                },
            );
        }
        Ok(hash)
    }
}
