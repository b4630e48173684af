use alloy::primitives::{Address, Bytes};
use serde_json::Value;
use tracing::debug;

use crate::abi;
use crate::domain::{NetworkDescriptor, ProviderEvent};
use crate::ports::{ProviderError, ProviderPort, RpcMethod};

/// Typed calls over a [`ProviderPort`]. Every response is validated before it
/// leaves this type; nothing is retried here.
#[derive(Debug, Clone)]
pub struct ProviderBridge<P> {
    provider: P,
}

impl<P: ProviderPort> ProviderBridge<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn send(&self, method: RpcMethod, params: Value) -> Result<Value, ProviderError> {
        debug!(method = method.as_str(), prompt = method.may_prompt(), "provider request");
        let result = self.provider.request(method, params).await;
        if let Err(ref e) = result {
            debug!(method = method.as_str(), error = %e, "provider request failed");
        }
        result
    }

    /// Accounts already authorized for this origin. Never prompts.
    pub async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let result = self.send(RpcMethod::Accounts, serde_json::json!([])).await?;
        parse_accounts(RpcMethod::Accounts, &result)
    }

    /// Ask the user to authorize accounts. Stays pending until the user answers.
    pub async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let result = self
            .send(RpcMethod::RequestAccounts, serde_json::json!([]))
            .await?;
        parse_accounts(RpcMethod::RequestAccounts, &result)
    }

    pub async fn chain_id(&self) -> Result<u64, ProviderError> {
        let result = self.send(RpcMethod::ChainId, serde_json::json!([])).await?;
        json_chain_id_to_u64(&result)
    }

    pub async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.send(
            RpcMethod::SwitchChain,
            serde_json::json!([{ "chainId": format!("{chain_id:#x}") }]),
        )
        .await
        .map(|_| ())
    }

    pub async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ProviderError> {
        self.send(RpcMethod::AddChain, add_chain_params(network))
            .await
            .map(|_| ())
    }

    /// Read-only contract call; returns the raw hex string from the provider.
    pub async fn call(&self, to: Address, data: &Bytes) -> Result<String, ProviderError> {
        let result = self
            .send(RpcMethod::Call, abi::call_params(to, data))
            .await?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| ProviderError::InvalidResponse("eth_call must return hex string".to_owned()))
    }

    pub async fn balance_of(
        &self,
        token: Address,
        owner: Address,
    ) -> Result<String, ProviderError> {
        self.call(token, &abi::encode_balance_query(owner)).await
    }

    pub fn drain_events(&self) -> Result<Vec<ProviderEvent>, ProviderError> {
        self.provider.drain_events()
    }
}

/// `wallet_addEthereumChain` params in EIP-3085 shape.
pub fn add_chain_params(network: &NetworkDescriptor) -> Value {
    serde_json::json!([{
        "chainId": network.chain_id_hex(),
        "chainName": network.chain_name,
        "nativeCurrency": {
            "name": network.native_currency.name,
            "symbol": network.native_currency.symbol,
            "decimals": network.native_currency.decimals,
        },
        "rpcUrls": network.rpc_urls,
        "blockExplorerUrls": network.block_explorer_urls,
    }])
}

fn parse_accounts(method: RpcMethod, value: &Value) -> Result<Vec<Address>, ProviderError> {
    let arr = value.as_array().ok_or_else(|| {
        ProviderError::InvalidResponse(format!("{}: array expected", method.as_str()))
    })?;
    let mut accounts = Vec::with_capacity(arr.len());
    for item in arr {
        let raw = item.as_str().ok_or_else(|| {
            ProviderError::InvalidResponse(format!("{}: string expected", method.as_str()))
        })?;
        let parsed: Address = raw
            .parse()
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid account address: {e}")))?;
        accounts.push(parsed);
    }
    Ok(accounts)
}

pub fn json_chain_id_to_u64(value: &Value) -> Result<u64, ProviderError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let s = value.as_str().ok_or_else(|| {
        ProviderError::InvalidResponse("chain id must be string or number".to_owned())
    })?;
    parse_chain_id_str(s)
}

pub fn parse_chain_id_str(raw: &str) -> Result<u64, ProviderError> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid hex chain id: {e}")))
    } else {
        raw.parse()
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid chain id: {e}")))
    }
}
