use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{Address, U256};
use serde_json::Value;
use tracing::{debug, warn};

use parcero_wallet_core::bridge::{json_chain_id_to_u64, parse_chain_id_str};
use parcero_wallet_core::{
    ProviderError, ProviderEvent, ProviderEventKind, ProviderPort, RpcMethod,
};

use crate::simulated::SimulatedWallet;
use crate::WalletAdapterConfig;

#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
    #[cfg(target_arch = "wasm32")]
    hooks: Arc<Mutex<BrowserHooks>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    #[cfg(not(target_arch = "wasm32"))]
    Proxy(ProxyRuntime),
    #[cfg(target_arch = "wasm32")]
    Browser,
}

#[derive(Debug, Clone)]
#[cfg(not(target_arch = "wasm32"))]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Default)]
struct ProviderState {
    wallet: SimulatedWallet,
    /// Last account list and chain observed from a real provider.
    seen_accounts: Option<Vec<Address>>,
    seen_chain: Option<u64>,
    event_seq: u64,
    events: Vec<ProviderEvent>,
    request_log: Vec<RpcMethod>,
}

impl ProviderState {
    fn push_event(&mut self, kind: ProviderEventKind, value: String) {
        self.event_seq = self.event_seq.saturating_add(1);
        let sequence = self.event_seq;
        self.events.push(ProviderEvent {
            sequence,
            kind,
            value,
        });
    }

    fn observe_accounts(&mut self, accounts: Vec<Address>) {
        if self.seen_accounts.as_ref() != Some(&accounts) {
            self.push_event(ProviderEventKind::AccountsChanged, accounts_payload(&accounts));
            self.seen_accounts = Some(accounts);
        }
    }

    fn observe_chain(&mut self, chain_id: u64) {
        if self.seen_chain != Some(chain_id) {
            self.push_event(ProviderEventKind::ChainChanged, chain_id.to_string());
            self.seen_chain = Some(chain_id);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
struct BrowserHooks {
    accounts_changed: Option<wasm_bindgen::closure::Closure<dyn FnMut(wasm_bindgen::JsValue)>>,
    chain_changed: Option<wasm_bindgen::closure::Closure<dyn FnMut(wasm_bindgen::JsValue)>>,
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(WalletAdapterConfig::from_env())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: WalletAdapterConfig) -> Self {
        #[cfg(target_arch = "wasm32")]
        let mode = if browser_provider_available() {
            ProviderMode::Browser
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 browser provider not found in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };

        #[cfg(not(target_arch = "wasm32"))]
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            let mut builder = reqwest::Client::builder();
            if let Some(ms) = config.proxy_timeout_ms {
                builder = builder.timeout(std::time::Duration::from_millis(ms));
            }
            match builder.build() {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        ProviderMode::Disabled(format!(
                            "failed to initialize EIP-1193 proxy client in production profile: {e}"
                        ))
                    } else {
                        warn!(error = %e, "proxy client unavailable, using simulated wallet");
                        ProviderMode::Deterministic
                    }
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };

        debug!(mode = mode.label(), "eip1193 adapter initialized");
        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
            #[cfg(target_arch = "wasm32")]
            hooks: Arc::new(Mutex::new(BrowserHooks::default())),
        }
    }

    /// Adapter backed by the in-process simulated wallet regardless of environment.
    pub fn deterministic() -> Self {
        Self {
            mode: ProviderMode::Deterministic,
            state: Arc::new(Mutex::new(ProviderState::default())),
            #[cfg(target_arch = "wasm32")]
            hooks: Arc::new(Mutex::new(BrowserHooks::default())),
        }
    }

    pub fn mode_label(&self) -> &'static str {
        self.mode.label()
    }

    fn state(&self) -> Result<MutexGuard<'_, ProviderState>, ProviderError> {
        self.state
            .lock()
            .map_err(|e| ProviderError::Transport(format!("provider lock poisoned: {e}")))
    }

    /// Methods seen by this adapter, oldest first.
    pub fn request_log(&self) -> Result<Vec<RpcMethod>, ProviderError> {
        Ok(self.state()?.request_log.clone())
    }

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<(), ProviderError> {
        let mut g = self.state()?;
        g.wallet.authorized = !accounts.is_empty();
        if !accounts.is_empty() {
            g.wallet.accounts = accounts.clone();
        }
        let payload = accounts_payload(&accounts);
        g.push_event(ProviderEventKind::AccountsChanged, payload);
        Ok(())
    }

    pub fn debug_inject_chain_changed(&self, chain_id: u64) -> Result<(), ProviderError> {
        let mut g = self.state()?;
        g.wallet.chain_id = chain_id;
        g.wallet.known_chains.insert(chain_id);
        g.push_event(ProviderEventKind::ChainChanged, chain_id.to_string());
        Ok(())
    }

    pub fn debug_set_balance(
        &self,
        token: Address,
        owner: Address,
        raw: U256,
    ) -> Result<(), ProviderError> {
        self.state()?.wallet.balances.insert((token, owner), raw);
        Ok(())
    }

    /// Make the simulated wallet decline every prompt with code 4001.
    pub fn debug_set_reject_prompts(&self, reject: bool) -> Result<(), ProviderError> {
        self.state()?.wallet.reject_prompts = reject;
        Ok(())
    }

    /// Treat a chain as already known to the simulated wallet.
    pub fn debug_register_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.state()?.wallet.known_chains.insert(chain_id);
        Ok(())
    }

    fn simulate(&self, method: RpcMethod, params: &Value) -> Result<Value, ProviderError> {
        let mut g = self.state()?;
        let before = g.wallet.chain_id;
        let result = g.wallet.handle(method, params)?;
        let after = g.wallet.chain_id;
        if before != after {
            g.push_event(ProviderEventKind::ChainChanged, after.to_string());
        }
        Ok(result)
    }

    /// Turn a real provider's answers into change events, since neither the
    /// proxy nor a non-subscribed browser provider pushes them to us.
    fn observe(
        &self,
        method: RpcMethod,
        requested_chain: Option<u64>,
        result: &Value,
    ) -> Result<(), ProviderError> {
        match method {
            RpcMethod::Accounts | RpcMethod::RequestAccounts => {
                let accounts: Vec<Address> = match serde_json::from_value(result.clone()) {
                    Ok(accounts) => accounts,
                    Err(_) => return Ok(()),
                };
                self.state()?.observe_accounts(accounts);
            }
            RpcMethod::ChainId => {
                if let Ok(chain_id) = json_chain_id_to_u64(result) {
                    self.state()?.observe_chain(chain_id);
                }
            }
            // A switch or registration the wallet accepted moves it to the
            // requested chain; an earlier eth_chainId answer is now stale.
            RpcMethod::SwitchChain | RpcMethod::AddChain => {
                if let Some(chain_id) = requested_chain {
                    self.state()?.observe_chain(chain_id);
                }
            }
            RpcMethod::Call => {}
        }
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn proxy_call(
        proxy: &ProxyRuntime,
        method: RpcMethod,
        params: Value,
    ) -> Result<Value, ProviderError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method.as_str(),
            "params": params,
        });
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            ProviderError::Transport(format!("eip1193 proxy json decode failed: {e}"))
        })?;
        if let Some(err) = body.get("error") {
            let code = err.get("code").and_then(Value::as_i64);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            return Err(match code {
                Some(code) => ProviderError::from_rpc(code, message),
                None => ProviderError::Transport(format!("eip1193 proxy returned error: {err}")),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| ProviderError::InvalidResponse("eip1193 proxy missing result".to_owned()))
    }

    #[cfg(target_arch = "wasm32")]
    async fn wasm_request(method: RpcMethod, params: Value) -> Result<Value, ProviderError> {
        use wasm_bindgen::JsCast;

        let provider = browser_provider()?;
        let request_fn = get_prop(&provider, "request")
            .ok()
            .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
            .ok_or_else(|| {
                ProviderError::Unavailable("window.ethereum.request is unavailable".to_owned())
            })?;

        let request = serde_json::json!({
            "method": method.as_str(),
            "params": params,
        });
        let request_js = serde_wasm_bindgen::to_value(&request)
            .map_err(|e| ProviderError::Transport(format!("failed to encode wasm request: {e}")))?;
        let promise_js = request_fn.call1(&provider, &request_js).map_err(|e| {
            ProviderError::Transport(format!("provider request dispatch failed: {e:?}"))
        })?;
        let promise = promise_js.dyn_into::<js_sys::Promise>().map_err(|_| {
            ProviderError::InvalidResponse("provider request did not return Promise".to_owned())
        })?;
        let result_js = wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map_err(js_rejection)?;
        serde_wasm_bindgen::from_value(result_js)
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to decode wasm response: {e}")))
    }

    /// Subscribe to `accountsChanged` and `chainChanged` on the injected provider.
    /// Idempotent; callers opt in once the UI is ready to consume events.
    #[cfg(target_arch = "wasm32")]
    pub fn register_browser_hooks(&self) -> Result<(), ProviderError> {
        use wasm_bindgen::{closure::Closure, JsCast, JsValue};

        if !matches!(self.mode, ProviderMode::Browser) {
            return Ok(());
        }
        let provider = browser_provider()?;
        let on_fn = get_prop(&provider, "on")
            .ok()
            .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
            .ok_or_else(|| {
                ProviderError::Unavailable("provider does not expose on()".to_owned())
            })?;

        let mut hooks = self
            .hooks
            .lock()
            .map_err(|e| ProviderError::Transport(format!("provider hooks lock poisoned: {e}")))?;
        if hooks.accounts_changed.is_some() && hooks.chain_changed.is_some() {
            return Ok(());
        }

        let state_for_accounts = Arc::clone(&self.state);
        let accounts_cb = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let mut accounts = Vec::new();
            if js_sys::Array::is_array(&value) {
                for item in js_sys::Array::from(&value).iter() {
                    if let Some(addr) = item.as_string().and_then(|raw| raw.parse::<Address>().ok()) {
                        accounts.push(addr);
                    }
                }
            }
            if let Ok(mut g) = state_for_accounts.lock() {
                g.observe_accounts(accounts);
            }
        });

        let state_for_chain = Arc::clone(&self.state);
        let chain_cb = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            if let Ok(chain_id) = js_chain_id_to_u64(value) {
                if let Ok(mut g) = state_for_chain.lock() {
                    g.observe_chain(chain_id);
                }
            }
        });

        on_fn
            .call2(
                &provider,
                &JsValue::from_str("accountsChanged"),
                accounts_cb.as_ref().unchecked_ref(),
            )
            .map_err(|e| ProviderError::Transport(format!("register accountsChanged failed: {e:?}")))?;
        on_fn
            .call2(
                &provider,
                &JsValue::from_str("chainChanged"),
                chain_cb.as_ref().unchecked_ref(),
            )
            .map_err(|e| ProviderError::Transport(format!("register chainChanged failed: {e:?}")))?;

        hooks.accounts_changed = Some(accounts_cb);
        hooks.chain_changed = Some(chain_cb);
        Ok(())
    }
}

impl ProviderMode {
    fn label(&self) -> &'static str {
        match self {
            Self::Disabled(_) => "disabled",
            Self::Deterministic => "deterministic",
            #[cfg(not(target_arch = "wasm32"))]
            Self::Proxy(_) => "proxy",
            #[cfg(target_arch = "wasm32")]
            Self::Browser => "browser",
        }
    }
}

impl ProviderPort for Eip1193Adapter {
    async fn request(&self, method: RpcMethod, params: Value) -> Result<Value, ProviderError> {
        self.state()?.request_log.push(method);
        let requested_chain = requested_chain_id(method, &params);

        match &self.mode {
            ProviderMode::Disabled(reason) => Err(ProviderError::Unavailable(reason.clone())),
            ProviderMode::Deterministic => self.simulate(method, &params),
            #[cfg(not(target_arch = "wasm32"))]
            ProviderMode::Proxy(proxy) => {
                let result = Self::proxy_call(proxy, method, params).await?;
                self.observe(method, requested_chain, &result)?;
                Ok(result)
            }
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser => {
                let result = Self::wasm_request(method, params).await?;
                self.observe(method, requested_chain, &result)?;
                Ok(result)
            }
        }
    }

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, ProviderError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(ProviderError::Unavailable(reason.clone()));
        }
        Ok(std::mem::take(&mut self.state()?.events))
    }
}

/// Target chain of a `wallet_switchEthereumChain` / `wallet_addEthereumChain` request.
fn requested_chain_id(method: RpcMethod, params: &Value) -> Option<u64> {
    if !matches!(method, RpcMethod::SwitchChain | RpcMethod::AddChain) {
        return None;
    }
    params
        .get(0)
        .and_then(|p| p.get("chainId"))
        .and_then(Value::as_str)
        .and_then(|raw| parse_chain_id_str(raw).ok())
}

fn accounts_payload(accounts: &[Address]) -> String {
    serde_json::json!(accounts.iter().map(|a| a.to_string()).collect::<Vec<_>>()).to_string()
}

#[cfg(target_arch = "wasm32")]
fn browser_provider_available() -> bool {
    browser_provider().is_ok()
}

#[cfg(target_arch = "wasm32")]
fn browser_provider() -> Result<wasm_bindgen::JsValue, ProviderError> {
    let window = web_sys::window()
        .ok_or_else(|| ProviderError::Unavailable("missing window".to_owned()))?;
    let provider = get_prop(&window.into(), "ethereum")?;
    if provider.is_null() || provider.is_undefined() {
        return Err(ProviderError::Unavailable("window.ethereum missing".to_owned()));
    }
    Ok(provider)
}

#[cfg(target_arch = "wasm32")]
fn get_prop(
    target: &wasm_bindgen::JsValue,
    key: &str,
) -> Result<wasm_bindgen::JsValue, ProviderError> {
    js_sys::Reflect::get(target, &wasm_bindgen::JsValue::from_str(key)).map_err(|e| {
        ProviderError::Transport(format!("read provider property {key} failed: {e:?}"))
    })
}

/// Map a rejected provider promise onto a structured error, keeping the
/// EIP-1193 `code` when the wallet supplied one.
#[cfg(target_arch = "wasm32")]
fn js_rejection(err: wasm_bindgen::JsValue) -> ProviderError {
    let code = get_prop(&err, "code").ok().and_then(|v| v.as_f64());
    let message = get_prop(&err, "message")
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    match code {
        Some(code) => ProviderError::from_rpc(code as i64, message),
        None => ProviderError::Transport(format!("provider request rejected: {message}")),
    }
}

#[cfg(target_arch = "wasm32")]
fn js_chain_id_to_u64(value: wasm_bindgen::JsValue) -> Result<u64, ProviderError> {
    if let Some(s) = value.as_string() {
        return parse_chain_id_str(&s);
    }
    if let Some(num) = value.as_f64() {
        return Ok(num as u64);
    }
    Err(ProviderError::InvalidResponse("invalid JS chain id".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuntimeProfile;

    #[test]
    fn production_without_proxy_is_disabled() {
        let adapter = Eip1193Adapter::with_config(WalletAdapterConfig {
            runtime_profile: RuntimeProfile::Production,
            ..WalletAdapterConfig::default()
        });
        assert_eq!(adapter.mode_label(), "disabled");
        let err = adapter.drain_events().expect_err("disabled");
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[test]
    fn development_without_proxy_is_deterministic() {
        let adapter = Eip1193Adapter::with_config(WalletAdapterConfig::default());
        assert_eq!(adapter.mode_label(), "deterministic");
    }

    #[test]
    fn proxy_url_selects_proxy_mode() {
        let adapter = Eip1193Adapter::with_config(WalletAdapterConfig {
            eip1193_proxy_url: Some("http://127.0.0.1:9".to_owned()),
            ..WalletAdapterConfig::default()
        });
        assert_eq!(adapter.mode_label(), "proxy");
    }

    #[test]
    fn injected_events_drain_once_in_order() {
        let adapter = Eip1193Adapter::deterministic();
        adapter
            .debug_inject_chain_changed(137)
            .expect("inject chain");
        adapter
            .debug_inject_accounts_changed(Vec::new())
            .expect("inject accounts");
        let events = adapter.drain_events().expect("drain");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 1);
        assert_eq!(events[0].kind, ProviderEventKind::ChainChanged);
        assert_eq!(events[0].value, "137");
        assert_eq!(events[1].kind, ProviderEventKind::AccountsChanged);
        assert_eq!(events[1].value, "[]");
        assert!(adapter.drain_events().expect("drain").is_empty());
    }

    #[test]
    fn requested_chain_is_read_from_switch_and_add_params() {
        let params = serde_json::json!([{ "chainId": "0x89" }]);
        assert_eq!(requested_chain_id(RpcMethod::SwitchChain, &params), Some(137));
        assert_eq!(requested_chain_id(RpcMethod::AddChain, &params), Some(137));
        assert_eq!(requested_chain_id(RpcMethod::ChainId, &params), None);
        assert_eq!(
            requested_chain_id(RpcMethod::SwitchChain, &serde_json::json!([])),
            None
        );
    }

    #[test]
    fn observed_answers_only_emit_on_change() {
        let mut state = ProviderState::default();
        state.observe_chain(1);
        state.observe_chain(1);
        state.observe_chain(137);
        assert_eq!(state.events.len(), 2);
        assert_eq!(state.events[1].value, "137");
    }
}
