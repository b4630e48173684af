use serde_json::Value;
use thiserror::Error;

use crate::domain::ProviderEvent;

/// Provider code for a request the user declined (EIP-1193).
pub const USER_REJECTED_CODE: i64 = 4001;
/// Provider code for a chain the wallet has never been told about (EIP-3326).
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("wallet provider unavailable: {0}")]
    Unavailable(String),
    #[error("request rejected by user: {0}")]
    Rejected(String),
    #[error("chain not registered with wallet: {0}")]
    ChainNotRegistered(String),
    #[error("provider error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("provider transport error: {0}")]
    Transport(String),
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Classify a structured `{ code, message }` failure reported by the provider.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            USER_REJECTED_CODE => Self::Rejected(message),
            UNRECOGNIZED_CHAIN_CODE => Self::ChainNotRegistered(message),
            _ => Self::Rpc { code, message },
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rejected(_) => Some(USER_REJECTED_CODE),
            Self::ChainNotRegistered(_) => Some(UNRECOGNIZED_CHAIN_CODE),
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("session storage unavailable: {0}")]
    Unavailable(String),
    #[error("session storage io error: {0}")]
    Io(String),
    #[error("session storage corrupt: {0}")]
    Corrupt(String),
}

/// The provider methods this client is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    Accounts,
    ChainId,
    RequestAccounts,
    SwitchChain,
    AddChain,
    Call,
}

impl RpcMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            RpcMethod::Accounts => "eth_accounts",
            RpcMethod::ChainId => "eth_chainId",
            RpcMethod::RequestAccounts => "eth_requestAccounts",
            RpcMethod::SwitchChain => "wallet_switchEthereumChain",
            RpcMethod::AddChain => "wallet_addEthereumChain",
            RpcMethod::Call => "eth_call",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "eth_accounts" => Some(RpcMethod::Accounts),
            "eth_chainId" => Some(RpcMethod::ChainId),
            "eth_requestAccounts" => Some(RpcMethod::RequestAccounts),
            "wallet_switchEthereumChain" => Some(RpcMethod::SwitchChain),
            "wallet_addEthereumChain" => Some(RpcMethod::AddChain),
            "eth_call" => Some(RpcMethod::Call),
            _ => None,
        }
    }

    /// Whether the wallet may show the user a prompt for this call.
    pub fn may_prompt(self) -> bool {
        matches!(
            self,
            RpcMethod::RequestAccounts | RpcMethod::SwitchChain | RpcMethod::AddChain
        )
    }
}

/// An injected EIP-1193 provider. Futures are not required to be `Send` so a
/// browser `Promise` can back them.
#[allow(async_fn_in_trait)]
pub trait ProviderPort {
    async fn request(&self, method: RpcMethod, params: Value) -> Result<Value, ProviderError>;
    fn drain_events(&self) -> Result<Vec<ProviderEvent>, ProviderError>;
}

/// String key/value storage with `localStorage` semantics.
pub trait SessionStorePort {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}
