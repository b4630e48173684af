//! In-process stand-in for a browser wallet, used when no real provider is
//! configured outside production.

use std::collections::{BTreeSet, HashMap};

use alloy::primitives::{address, hex, Address, U256};
use serde_json::Value;

use parcero_wallet_core::abi::{BALANCE_OF_SELECTOR, WORD_SIZE};
use parcero_wallet_core::bridge::parse_chain_id_str;
use parcero_wallet_core::ports::{USER_REJECTED_CODE, UNRECOGNIZED_CHAIN_CODE};
use parcero_wallet_core::{ProviderError, RpcMethod};

const REJECTED_MESSAGE: &str = "User rejected the request.";

/// Account the simulated wallet hands out on authorization.
pub const DEFAULT_ACCOUNT: Address = address!("1000000000000000000000000000000000000001");

#[derive(Debug, Clone)]
pub(crate) struct SimulatedWallet {
    pub accounts: Vec<Address>,
    pub authorized: bool,
    pub chain_id: u64,
    pub known_chains: BTreeSet<u64>,
    pub balances: HashMap<(Address, Address), U256>,
    pub reject_prompts: bool,
}

impl Default for SimulatedWallet {
    fn default() -> Self {
        Self {
            accounts: vec![DEFAULT_ACCOUNT],
            authorized: false,
            chain_id: 1,
            known_chains: BTreeSet::from([1]),
            balances: HashMap::new(),
            reject_prompts: false,
        }
    }
}

impl SimulatedWallet {
    pub fn handle(&mut self, method: RpcMethod, params: &Value) -> Result<Value, ProviderError> {
        if self.reject_prompts && method.may_prompt() {
            return Err(ProviderError::from_rpc(USER_REJECTED_CODE, REJECTED_MESSAGE));
        }
        match method {
            RpcMethod::Accounts => Ok(if self.authorized {
                self.accounts_json()
            } else {
                serde_json::json!([])
            }),
            RpcMethod::RequestAccounts => {
                self.authorized = true;
                Ok(self.accounts_json())
            }
            RpcMethod::ChainId => Ok(Value::String(format!("{:#x}", self.chain_id))),
            RpcMethod::SwitchChain => {
                let chain_id = requested_chain_id(params)?;
                if !self.known_chains.contains(&chain_id) {
                    return Err(ProviderError::from_rpc(
                        UNRECOGNIZED_CHAIN_CODE,
                        format!(
                            "Unrecognized chain ID \"{chain_id:#x}\". Try adding the chain using wallet_addEthereumChain first."
                        ),
                    ));
                }
                self.chain_id = chain_id;
                Ok(Value::Null)
            }
            RpcMethod::AddChain => {
                let chain_id = requested_chain_id(params)?;
                self.known_chains.insert(chain_id);
                self.chain_id = chain_id;
                Ok(Value::Null)
            }
            RpcMethod::Call => self.call(params),
        }
    }

    fn accounts_json(&self) -> Value {
        serde_json::json!(self
            .accounts
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>())
    }

    fn call(&self, params: &Value) -> Result<Value, ProviderError> {
        let call = params
            .get(0)
            .ok_or_else(|| invalid_params("eth_call: missing call object"))?;
        let to: Address = call
            .get("to")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid_params("eth_call: missing to"))?
            .parse()
            .map_err(|e| invalid_params(format!("eth_call: invalid to: {e}")))?;
        let data = call
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid_params("eth_call: missing data"))?;
        let data = hex::decode(data).map_err(|e| invalid_params(format!("eth_call: {e}")))?;

        if data.len() != 4 + WORD_SIZE || data[..4] != BALANCE_OF_SELECTOR {
            return Err(ProviderError::Rpc {
                code: -32000,
                message: "execution reverted".to_owned(),
            });
        }
        let owner = Address::from_slice(&data[4 + WORD_SIZE - 20..]);
        let balance = self
            .balances
            .get(&(to, owner))
            .copied()
            .unwrap_or(U256::ZERO);
        Ok(Value::String(hex::encode_prefixed(
            balance.to_be_bytes::<32>(),
        )))
    }
}

fn requested_chain_id(params: &Value) -> Result<u64, ProviderError> {
    let raw = params
        .get(0)
        .and_then(|p| p.get("chainId"))
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_params("missing chainId"))?;
    parse_chain_id_str(raw)
}

fn invalid_params(message: impl Into<String>) -> ProviderError {
    ProviderError::Rpc {
        code: -32602,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounts_stay_hidden_until_requested() {
        let mut wallet = SimulatedWallet::default();
        let before = wallet
            .handle(RpcMethod::Accounts, &serde_json::json!([]))
            .expect("accounts");
        assert_eq!(before, serde_json::json!([]));
        wallet
            .handle(RpcMethod::RequestAccounts, &serde_json::json!([]))
            .expect("request");
        let after = wallet
            .handle(RpcMethod::Accounts, &serde_json::json!([]))
            .expect("accounts");
        assert_eq!(
            after,
            serde_json::json!(["0x1000000000000000000000000000000000000001"])
        );
    }

    #[test]
    fn unknown_chain_needs_registration() {
        let mut wallet = SimulatedWallet::default();
        let params = serde_json::json!([{ "chainId": "0x89" }]);
        let err = wallet
            .handle(RpcMethod::SwitchChain, &params)
            .expect_err("unknown chain");
        assert!(matches!(err, ProviderError::ChainNotRegistered(_)));
        wallet
            .handle(RpcMethod::AddChain, &params)
            .expect("add chain");
        assert_eq!(wallet.chain_id, 137);
        wallet
            .handle(RpcMethod::SwitchChain, &serde_json::json!([{ "chainId": "0x1" }]))
            .expect("switch back");
        assert_eq!(wallet.chain_id, 1);
    }

    #[test]
    fn rejection_applies_only_to_prompts() {
        let mut wallet = SimulatedWallet {
            reject_prompts: true,
            ..SimulatedWallet::default()
        };
        let err = wallet
            .handle(RpcMethod::RequestAccounts, &serde_json::json!([]))
            .expect_err("rejected");
        assert_eq!(err.code(), Some(4001));
        wallet
            .handle(RpcMethod::ChainId, &serde_json::json!([]))
            .expect("chain id never prompts");
    }

    #[test]
    fn unsupported_call_reverts() {
        let wallet = SimulatedWallet::default();
        let err = wallet
            .call(&serde_json::json!([{
                "to": "0x2a1c0f1b7d8e3f6a9b4c5d2e8f7a6b3c1d0e9f8a",
                "data": "0x18160ddd"
            }]))
            .expect_err("totalSupply is not simulated");
        assert_eq!(err.code(), Some(-32000));
    }
}
