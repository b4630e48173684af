use std::path::PathBuf;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeProfile {
    #[default]
    Development,
    Production,
}

impl RuntimeProfile {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WalletAdapterConfig {
    pub runtime_profile: RuntimeProfile,
    /// JSON-RPC endpoint relaying requests to a real wallet (native builds).
    pub eip1193_proxy_url: Option<String>,
    /// HTTP timeout for the proxy. `None` waits as long as the wallet does.
    pub proxy_timeout_ms: Option<u64>,
    /// Where the opt-out flag is persisted natively. `None` keeps it in memory.
    pub session_file: Option<PathBuf>,
}

impl WalletAdapterConfig {
    pub const PROFILE_ENV: &'static str = "PARCERO_RUNTIME_PROFILE";
    pub const PROXY_URL_ENV: &'static str = "PARCERO_EIP1193_PROXY_URL";
    pub const PROXY_TIMEOUT_ENV: &'static str = "PARCERO_PROXY_TIMEOUT_MS";
    pub const SESSION_FILE_ENV: &'static str = "PARCERO_SESSION_FILE";

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or blank keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(raw) = get(Self::PROFILE_ENV) {
            match RuntimeProfile::parse(&raw) {
                Some(profile) => cfg.runtime_profile = profile,
                None => warn!(value = %raw, "unknown runtime profile, using development"),
            }
        }
        cfg.eip1193_proxy_url = get(Self::PROXY_URL_ENV).map(|v| v.trim().to_owned());
        if let Some(raw) = get(Self::PROXY_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => cfg.proxy_timeout_ms = Some(ms),
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid proxy timeout"),
            }
        }
        cfg.session_file = get(Self::SESSION_FILE_ENV).map(PathBuf::from);
        cfg
    }

    /// Production never falls back to the simulated wallet.
    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }
}
