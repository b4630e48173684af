#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use alloy::primitives::{hex, Address, U256};
use serde_json::Value;
use tokio::sync::oneshot;

use parcero_wallet_core::{
    ProviderError, ProviderEvent, ProviderPort, RpcMethod, SessionStorePort, StoreError,
    WalletManager, WalletSettings,
};

/// Provider double answering from per-method queues. A gated method parks
/// the request until the test releases it.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    responses: Mutex<HashMap<RpcMethod, VecDeque<Result<Value, ProviderError>>>>,
    gates: Mutex<HashMap<RpcMethod, oneshot::Receiver<()>>>,
    calls: Mutex<Vec<(RpcMethod, Value)>>,
    events: Mutex<Vec<ProviderEvent>>,
}

impl ScriptedProvider {
    pub fn respond(&self, method: RpcMethod, result: Result<Value, ProviderError>) -> &Self {
        self.responses
            .lock()
            .expect("responses lock")
            .entry(method)
            .or_default()
            .push_back(result);
        self
    }

    /// Hold the next `method` request until the returned sender fires.
    pub fn gate(&self, method: RpcMethod) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().expect("gates lock").insert(method, rx);
        tx
    }

    pub fn push_event(&self, event: ProviderEvent) {
        self.events.lock().expect("events lock").push(event);
    }

    pub fn calls(&self) -> Vec<(RpcMethod, Value)> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn count(&self, method: RpcMethod) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|(m, _)| *m == method)
            .count()
    }
}

impl ProviderPort for ScriptedProvider {
    async fn request(&self, method: RpcMethod, params: Value) -> Result<Value, ProviderError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((method, params));
        let gate = self.gates.lock().expect("gates lock").remove(&method);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.responses
            .lock()
            .expect("responses lock")
            .get_mut(&method)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(ProviderError::Rpc {
                    code: -32601,
                    message: format!("no scripted response for {}", method.as_str()),
                })
            })
    }

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, ProviderError> {
        Ok(std::mem::take(&mut *self.events.lock().expect("events lock")))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn with_item(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .items
            .lock()
            .expect("items lock")
            .insert(key.to_owned(), value.to_owned());
        store
    }
}

impl SessionStorePort for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.lock().expect("items lock").get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items
            .lock()
            .expect("items lock")
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.lock().expect("items lock").remove(key);
        Ok(())
    }
}

pub type TestManager = WalletManager<ScriptedProvider, MemoryStore>;

pub fn new_manager() -> TestManager {
    WalletManager::new(
        ScriptedProvider::default(),
        MemoryStore::default(),
        WalletSettings::default(),
    )
}

pub fn account() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid account")
}

pub fn other_account() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("valid account")
}

pub fn accounts_json(accounts: &[Address]) -> Value {
    serde_json::json!(accounts.iter().map(|a| a.to_string()).collect::<Vec<_>>())
}

/// 32-byte `eth_call` return word holding `whole` tokens at 18 decimals.
pub fn balance_word(whole: u64) -> Value {
    let raw = U256::from(whole) * U256::from(10u64.pow(18));
    Value::String(hex::encode_prefixed(raw.to_be_bytes::<32>()))
}

/// Wait until the provider has seen `n` calls to `method`.
pub async fn wait_for_call(provider: &ScriptedProvider, method: RpcMethod, n: usize) {
    while provider.count(method) < n {
        tokio::task::yield_now().await;
    }
}
