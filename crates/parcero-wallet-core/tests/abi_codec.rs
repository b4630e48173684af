use alloy::primitives::{hex, keccak256, Address, U256};
use parcero_wallet_core::abi::{balance_of_call, decode_uint256};
use parcero_wallet_core::{decode_balance, encode_balance_query, DecodeError, BALANCE_OF_SELECTOR};

#[test]
fn selector_matches_canonical_signature_hash() {
    let hash = keccak256("balanceOf(address)".as_bytes());
    assert_eq!(&hash[..4], &BALANCE_OF_SELECTOR);
    assert_eq!(BALANCE_OF_SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
}

#[test]
fn balance_query_is_selector_plus_padded_address() {
    let owners: [Address; 3] = [
        Address::ZERO,
        "0x1000000000000000000000000000000000000001"
            .parse()
            .expect("owner"),
        "0xffffffffffffffffffffffffffffffffffffffff"
            .parse()
            .expect("owner"),
    ];
    for owner in owners {
        let data = encode_balance_query(owner);
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert!(data[4..16].iter().all(|b| *b == 0));
        assert_eq!(&data[16..], owner.as_slice());
    }
}

#[test]
fn balance_call_params_are_eth_call_shaped() {
    let token: Address = "0x2a1c0f1b7d8e3f6a9b4c5d2e8f7a6b3c1d0e9f8a"
        .parse()
        .expect("token");
    let owner: Address = "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("owner");
    let params = balance_of_call(token, owner);
    assert_eq!(params[0]["to"], "0x2a1c0f1b7d8e3f6a9b4c5d2e8f7a6b3c1d0e9f8a");
    assert_eq!(
        params[0]["data"],
        "0x70a082310000000000000000000000001000000000000000000000000000000000000001"
    );
    assert_eq!(params[1], "latest");
}

#[test]
fn smallest_unit_keeps_full_precision() {
    let raw = format!("0x{}1", "0".repeat(63));
    let amount = decode_balance(&raw, 18).expect("decode");
    assert_eq!(amount.raw, U256::from(1u64));
    assert_eq!(amount.to_string(), "0.000000000000000001");
}

#[test]
fn whole_tokens_render_with_eight_fraction_digits() {
    // 5 * 10^18
    let amount = decode_balance(
        "0x0000000000000000000000000000000000000000000000004563918244f40000",
        18,
    )
    .expect("decode");
    assert_eq!(amount.to_string(), "5.00000000");
}

#[test]
fn large_balances_do_not_lose_precision() {
    // 123456789.123456789123456789 tokens
    let raw = U256::from(123_456_789_123_456_789_123_456_789u128);
    let amount =
        decode_balance(&hex::encode_prefixed(raw.to_be_bytes::<32>()), 18).expect("decode");
    assert_eq!(amount.to_string(), "123456789.123456789123456789");
}

#[test]
fn zero_balance_renders_as_zero() {
    let amount = decode_balance(&format!("0x{}", "0".repeat(64)), 18).expect("decode");
    assert_eq!(amount.to_string(), "0.00000000");
}

#[test]
fn malformed_return_data_is_a_decode_error() {
    assert_eq!(decode_balance("0x", 18), Err(DecodeError::Empty));
    assert_eq!(decode_balance("", 18), Err(DecodeError::Empty));
    assert!(matches!(
        decode_balance("0xnot-hex", 18),
        Err(DecodeError::InvalidHex(_))
    ));
    assert_eq!(
        decode_balance(&format!("0x{}", "f".repeat(66)), 18),
        Err(DecodeError::Overflow(66))
    );
    assert_eq!(
        decode_balance("0x01", 78),
        Err(DecodeError::UnsupportedDecimals(78))
    );
}

#[test]
fn prefix_is_optional() {
    assert_eq!(decode_uint256("ff").expect("decode"), U256::from(255u64));
    assert_eq!(decode_uint256("0XFF").expect("decode"), U256::from(255u64));
}
