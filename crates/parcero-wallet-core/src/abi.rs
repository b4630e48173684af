//! Hand-rolled ABI for the single contract call this client makes:
//! `balanceOf(address) returns (uint256)`.

use alloy::primitives::{hex, Address, Bytes, U256};
use serde_json::Value;
use thiserror::Error;

use crate::domain::TokenAmount;

/// `keccak256("balanceOf(address)")[..4]`
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

pub const WORD_SIZE: usize = 32;

/// Largest exponent for which `10^decimals` fits in a U256.
pub const MAX_DECIMALS: u8 = 77;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty return data")]
    Empty,
    #[error("return data is not hex: {0}")]
    InvalidHex(String),
    #[error("return data exceeds one 256-bit word ({0} hex digits)")]
    Overflow(usize),
    #[error("unsupported token decimals: {0}")]
    UnsupportedDecimals(u8),
}

/// Calldata for `balanceOf(owner)`: selector followed by the owner address
/// right-aligned in one 32-byte word.
pub fn encode_balance_query(owner: Address) -> Bytes {
    let mut out = Vec::with_capacity(4 + WORD_SIZE);
    out.extend_from_slice(&BALANCE_OF_SELECTOR);
    out.extend_from_slice(&[0u8; WORD_SIZE - 20]);
    out.extend_from_slice(owner.as_slice());
    Bytes::from(out)
}

/// `eth_call` params for `data` sent to `to` at the latest block.
pub fn call_params(to: Address, data: &[u8]) -> Value {
    serde_json::json!([
        {
            "to": format!("{to:#x}"),
            "data": hex::encode_prefixed(data),
        },
        "latest"
    ])
}

/// `eth_call` params reading `owner`'s balance of `token`.
pub fn balance_of_call(token: Address, owner: Address) -> Value {
    call_params(token, &encode_balance_query(owner))
}

/// Parse a big-endian hex quantity as returned by `eth_call`.
pub fn decode_uint256(raw: &str) -> Result<U256, DecodeError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(DecodeError::Empty);
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(DecodeError::InvalidHex(format!(
            "unexpected character {bad:?} in {raw:?}"
        )));
    }
    if digits.len() > 2 * WORD_SIZE {
        return Err(DecodeError::Overflow(digits.len()));
    }
    U256::from_str_radix(digits, 16).map_err(|e| DecodeError::InvalidHex(e.to_string()))
}

/// Decode a `balanceOf` result into an amount scaled by `decimals`.
pub fn decode_balance(raw: &str, decimals: u8) -> Result<TokenAmount, DecodeError> {
    if decimals > MAX_DECIMALS {
        return Err(DecodeError::UnsupportedDecimals(decimals));
    }
    let value = decode_uint256(raw)?;
    Ok(TokenAmount::new(value, decimals))
}
