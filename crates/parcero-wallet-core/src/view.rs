use alloy::primitives::Address;
use serde::Serialize;

use crate::domain::{ConnectionState, ConnectionStatus, WalletSettings};

/// What a UI binds to: the connection record plus display-ready fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    pub status: ConnectionStatus,
    pub account: Option<Address>,
    pub short_account: Option<String>,
    pub chain_id: Option<u64>,
    pub wrong_network: bool,
    pub token_symbol: String,
    pub balance: Option<String>,
    pub explorer_url: Option<String>,
    pub error: Option<String>,
    pub is_loading: bool,
    pub can_connect: bool,
}

impl WalletView {
    pub fn project(state: &ConnectionState, settings: &WalletSettings) -> Self {
        let wrong_network = state.is_connected()
            && state
                .chain_id
                .is_some_and(|id| id != settings.network.chain_id);
        Self {
            status: state.status,
            account: state.account,
            short_account: state.account.map(short_address),
            chain_id: state.chain_id,
            wrong_network,
            token_symbol: settings.token.symbol.clone(),
            balance: state.balance().map(|b| b.to_string()),
            explorer_url: settings.token_explorer_url(),
            error: state.error.clone(),
            is_loading: state.is_loading,
            can_connect: !state.is_loading,
        }
    }
}

/// `0x1234…abcd` form of a checksummed address.
pub fn short_address(address: Address) -> String {
    let full = address.to_checksum(None);
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}
