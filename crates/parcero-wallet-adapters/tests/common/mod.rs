#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use alloy::primitives::{hex, Address, U256};
use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

use parcero_wallet_adapters::{
    Eip1193Adapter, MemorySessionStore, WalletAdapterConfig, DEFAULT_ACCOUNT,
};
use parcero_wallet_core::{WalletManager, WalletSettings};

pub type DeterministicManager = WalletManager<Eip1193Adapter, MemorySessionStore>;
pub type ProxyManager = WalletManager<Eip1193Adapter, MemorySessionStore>;

pub fn deterministic_manager() -> DeterministicManager {
    WalletManager::new(
        Eip1193Adapter::deterministic(),
        MemorySessionStore::default(),
        WalletSettings::default(),
    )
}

pub fn proxy_manager(base_url: &str) -> ProxyManager {
    let adapter = Eip1193Adapter::with_config(WalletAdapterConfig {
        eip1193_proxy_url: Some(base_url.to_owned()),
        proxy_timeout_ms: Some(5_000),
        ..WalletAdapterConfig::default()
    });
    assert_eq!(adapter.mode_label(), "proxy");
    WalletManager::new(adapter, MemorySessionStore::default(), WalletSettings::default())
}

pub fn account() -> Address {
    DEFAULT_ACCOUNT
}

pub fn other_account() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("valid account")
}

pub fn token() -> Address {
    WalletSettings::default().token.address
}

pub fn whole_tokens(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64.pow(18))
}

pub fn balance_word(raw: U256) -> Value {
    Value::String(hex::encode_prefixed(raw.to_be_bytes::<32>()))
}

pub fn rpc_result(result: Value) -> (u16, Value) {
    (200, json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
}

pub fn rpc_error(code: i64, message: &str) -> (u16, Value) {
    (
        200,
        json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": code, "message": message } }),
    )
}

/// JSON-RPC endpoint standing in for a wallet relay. Records every method it
/// was asked for.
pub struct RpcServer {
    pub url: String,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RpcServer {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

pub fn spawn_rpc_server<F>(handler: F) -> RpcServer
where
    F: Fn(&str, &Value) -> (u16, Value) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("start server");
    let url = format!("http://{}", server.server_addr());
    let calls = Arc::new(Mutex::new(Vec::<String>::new()));
    let seen = Arc::clone(&calls);

    thread::spawn(move || {
        for _ in 0..32 {
            let mut req = match server.recv_timeout(Duration::from_secs(10)) {
                Ok(Some(r)) => r,
                _ => break,
            };
            let mut body = String::new();
            let _ = req.as_reader().read_to_string(&mut body);
            let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            let method = payload
                .get("method")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            let params = payload.get("params").cloned().unwrap_or(Value::Null);
            if let Ok(mut g) = seen.lock() {
                g.push(method.clone());
            }

            let (code, reply) = handler(&method, &params);
            let response =
                Response::from_string(reply.to_string()).with_status_code(StatusCode(code));
            let _ = req.respond(response);
        }
    });

    RpcServer { url, calls }
}
