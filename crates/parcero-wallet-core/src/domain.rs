use std::fmt;

use alloy::primitives::{address, Address, U256};
use serde::{Deserialize, Serialize};

/// Chain id of Polygon PoS mainnet, the only network the platform token lives on.
pub const POLYGON_CHAIN_ID: u64 = 137;

/// PARCERO ERC-20 contract on Polygon.
pub const PARCERO_TOKEN_ADDRESS: Address = address!("2a1c0f1b7d8e3f6a9b4c5d2e8f7a6b3c1d0e9f8a");

/// Balances always render with at least this many fractional digits.
pub const MIN_FRACTION_DIGITS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// A raw ERC-20 quantity together with the decimals it is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub raw: U256,
    pub decimals: u8,
}

impl TokenAmount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }
}

impl fmt::Display for TokenAmount {
    /// Exact decimal rendering: every significant fractional digit is kept and
    /// at least [`MIN_FRACTION_DIGITS`] are always shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimals = usize::from(self.decimals);
        let digits = self.raw.to_string();
        let (int_part, frac_part) = if digits.len() > decimals {
            let split = digits.len() - decimals;
            (digits[..split].to_owned(), digits[split..].to_owned())
        } else {
            ("0".to_owned(), format!("{digits:0>decimals$}"))
        };

        let mut frac = frac_part.trim_end_matches('0').to_owned();
        if frac.len() < MIN_FRACTION_DIGITS {
            frac = format!("{frac:0<width$}", width = MIN_FRACTION_DIGITS);
        }
        write!(f, "{int_part}.{frac}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub contract_address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub balance: Option<TokenAmount>,
}

/// The single connection record owned by the lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub token_info: Option<TokenInfo>,
    pub error: Option<String>,
    pub is_loading: bool,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            account: None,
            chain_id: None,
            token_info: None,
            error: None,
            is_loading: false,
        }
    }
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    pub fn balance(&self) -> Option<TokenAmount> {
        self.token_info.as_ref().and_then(|t| t.balance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything a wallet needs to register a network (EIP-3085).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl NetworkDescriptor {
    pub fn polygon_mainnet() -> Self {
        Self {
            chain_id: POLYGON_CHAIN_ID,
            chain_name: "Polygon Mainnet".to_owned(),
            native_currency: NativeCurrency {
                name: "MATIC".to_owned(),
                symbol: "MATIC".to_owned(),
                decimals: 18,
            },
            rpc_urls: vec![
                "https://polygon-rpc.com/".to_owned(),
                "https://rpc-mainnet.maticvigil.com/".to_owned(),
            ],
            block_explorer_urls: vec!["https://polygonscan.com/".to_owned()],
        }
    }

    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    pub fn primary_explorer(&self) -> Option<&str> {
        self.block_explorer_urls
            .first()
            .map(|url| url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenContract {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenContract {
    pub fn parcero() -> Self {
        Self {
            address: PARCERO_TOKEN_ADDRESS,
            name: "Parcero".to_owned(),
            symbol: "PARCERO".to_owned(),
            decimals: 18,
        }
    }

    /// Token metadata as it appears in a fresh connection, before any balance read.
    pub fn base_info(&self) -> TokenInfo {
        TokenInfo {
            contract_address: self.address,
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            balance: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSettings {
    pub network: NetworkDescriptor,
    pub token: TokenContract,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            network: NetworkDescriptor::polygon_mainnet(),
            token: TokenContract::parcero(),
        }
    }
}

impl WalletSettings {
    /// Block-explorer page of the token contract.
    pub fn token_explorer_url(&self) -> Option<String> {
        self.network
            .primary_explorer()
            .map(|base| format!("{base}/token/{:#x}", self.token.address))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderEventKind {
    AccountsChanged,
    ChainChanged,
}

/// Notification pushed by the wallet outside of any request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEvent {
    pub sequence: u64,
    pub kind: ProviderEventKind,
    /// JSON array of addresses for `AccountsChanged`, decimal chain id for `ChainChanged`.
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_keeps_minimum_fraction_digits() {
        let amount = TokenAmount::new(U256::from(12_500_000_000_000_000_000u128), 18);
        assert_eq!(amount.to_string(), "12.50000000");
    }

    #[test]
    fn amount_with_few_decimals_is_padded() {
        assert_eq!(TokenAmount::new(U256::from(1234u64), 2).to_string(), "12.34000000");
        assert_eq!(TokenAmount::new(U256::from(7u64), 0).to_string(), "7.00000000");
    }

    #[test]
    fn amount_splits_whole_and_fraction_at_decimals() {
        let amount = TokenAmount::new(U256::from(1_250_000u64), 6);
        assert_eq!(amount.to_string(), "1.25000000");
        let sub_unit = TokenAmount::new(U256::from(250_000u64), 6);
        assert_eq!(sub_unit.to_string(), "0.25000000");
    }

    #[test]
    fn explorer_url_points_at_token_page() {
        let url = WalletSettings::default()
            .token_explorer_url()
            .expect("explorer configured");
        assert_eq!(
            url,
            "https://polygonscan.com/token/0x2a1c0f1b7d8e3f6a9b4c5d2e8f7a6b3c1d0e9f8a"
        );
    }

    #[test]
    fn chain_id_hex_is_prefixed() {
        assert_eq!(NetworkDescriptor::polygon_mainnet().chain_id_hex(), "0x89");
    }
}
