//! Minimal ERC-20 interface: transfer, balanceOf, decimals and the
//! Transfer event.

use alloy::primitives::{Address, Bytes, Log, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent};

sol! {
    #[derive(Debug)]
    interface IERC20 {
        /// Emitted on every token movement.
        event Transfer(address indexed from, address indexed to, uint256 value);

        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
    }
}

/// Selector of `transfer(address,uint256)`: `0xa9059cbb`.
pub const TRANSFER_SELECTOR: [u8; 4] = IERC20::transferCall::SELECTOR;

/// A decoded token movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTransfer {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// Decode a log as a `Transfer` event.
///
/// Returns `None` for logs of any other shape.
pub fn decode_transfer_log(log: &Log) -> Option<TokenTransfer> {
    let event = IERC20::Transfer::decode_log_data(&log.data).ok()?;
    Some(TokenTransfer {
        from: event.from,
        to: event.to,
        value: event.value,
    })
}

/// Decode raw `transfer(address,uint256)` call data.
///
/// The recipient is the low 20 bytes of the first 32-byte word and the
/// amount is the second word. Returns `(recipient, amount)`.
pub fn decode_transfer_call(input: &[u8]) -> Option<(Address, U256)> {
    if input.len() < 4 + 64 || input[..4] != TRANSFER_SELECTOR {
        return None;
    }
    let recipient = Address::from_slice(&input[16..36]);
    let amount = U256::from_be_slice(&input[36..68]);
    Some((recipient, amount))
}

/// Encode a `transfer(to, amount)` call.
pub fn encode_transfer(to: Address, amount: U256) -> Bytes {
    IERC20::transferCall { to, amount }.abi_encode().into()
}

/// Encode a `balanceOf(account)` call.
pub fn encode_balance_of(account: Address) -> Bytes {
    IERC20::balanceOfCall { account }.abi_encode().into()
}

/// Decode the 32-byte return word of `balanceOf`.
pub fn decode_balance(output: &[u8]) -> Option<U256> {
    (output.len() >= 32).then(|| U256::from_be_slice(&output[..32]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, hex, LogData};

    const FROM: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    const TO: Address = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");
    const TOKEN: Address = address!("75faf114eafb1bdbe2f0316df893fd58ce46aa4d");

    #[test]
    fn test_selector() {
        assert_eq!(TRANSFER_SELECTOR, hex!("a9059cbb"));
    }

    #[test]
    fn test_decode_transfer_log() {
        let event = IERC20::Transfer {
            from: FROM,
            to: TO,
            value: U256::from(1_000_000u64),
        };
        let log = Log {
            address: TOKEN,
            data: event.encode_log_data(),
        };

        let decoded = decode_transfer_log(&log).unwrap();
        assert_eq!(decoded.from, FROM);
        assert_eq!(decoded.to, TO);
        assert_eq!(decoded.value, U256::from(1_000_000u64));
    }

    #[test]
    fn test_malformed_log_is_skipped() {
        let log = Log {
            address: TOKEN,
            data: LogData::new_unchecked(vec![IERC20::Transfer::SIGNATURE_HASH], Bytes::new()),
        };
        assert!(decode_transfer_log(&log).is_none());
    }

    #[test]
    fn test_call_data_round_trip() {
        let input = encode_transfer(TO, U256::from(42u64));
        assert_eq!(input.len(), 68);
        assert_eq!(decode_transfer_call(&input), Some((TO, U256::from(42u64))));
    }

    #[test]
    fn test_call_data_rejects_other_selectors() {
        let input = encode_balance_of(TO);
        assert!(decode_transfer_call(&input).is_none());
        assert!(decode_transfer_call(&TRANSFER_SELECTOR).is_none());
    }

    #[test]
    fn test_decode_balance() {
        let word = U256::from(5_000_000u64).to_be_bytes::<32>();
        assert_eq!(decode_balance(&word), Some(U256::from(5_000_000u64)));
        assert_eq!(decode_balance(&word[..10]), None);
    }
}
