//! Bridge between the shell and the wallet workspace crates.
//! This must remain the only shell-facing boundary for wallet operations.

use std::sync::Arc;

use parcero_wallet_adapters::{Eip1193Adapter, SessionStore, WalletAdapterConfig};
use parcero_wallet_core::{
    ConnectionState, Outcome, WalletError, WalletManager, WalletSettings, WalletView,
};
use tracing::{info, warn};

use crate::explorer;

type Manager = WalletManager<Eip1193Adapter, SessionStore>;

#[derive(Clone)]
pub struct WalletBridge {
    manager: Arc<Manager>,
}

impl Default for WalletBridge {
    fn default() -> Self {
        Self::from_config(WalletAdapterConfig::from_env())
    }
}

impl WalletBridge {
    pub fn from_config(config: WalletAdapterConfig) -> Self {
        let store = SessionStore::from_config(&config);
        let adapter = Eip1193Adapter::with_config(config);
        info!(mode = adapter.mode_label(), "wallet provider selected");
        Self::with_parts(adapter, store, WalletSettings::default())
    }

    pub fn with_parts(adapter: Eip1193Adapter, store: SessionStore, settings: WalletSettings) -> Self {
        Self {
            manager: Arc::new(WalletManager::new(adapter, store, settings)),
        }
    }

    pub fn provider(&self) -> &Eip1193Adapter {
        self.manager.provider()
    }

    pub async fn start(&self) -> Result<Outcome, WalletError> {
        self.manager.start().await
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn view(&self) -> WalletView {
        self.manager.view()
    }

    pub async fn connect_wallet(&self) -> Result<Outcome, WalletError> {
        self.manager.connect_wallet().await
    }

    pub fn disconnect_wallet(&self) -> Result<(), WalletError> {
        self.manager.disconnect_wallet()
    }

    pub async fn refresh_balance(&self) -> Result<Outcome, WalletError> {
        self.manager.refresh_balance().await
    }

    pub async fn sync_provider_events(&self) -> Result<Outcome, WalletError> {
        self.manager.sync_provider_events().await
    }

    pub fn explorer_url(&self) -> Option<String> {
        explorer::token_url(self.manager.settings())
    }

    pub fn account_explorer_url(&self) -> Option<String> {
        let account = self.manager.state().account?;
        explorer::address_url(self.manager.settings(), account)
    }

    /// Open the token contract on the block explorer and return the URL.
    pub fn open_explorer(&self) -> eyre::Result<String> {
        let url = self
            .explorer_url()
            .ok_or_else(|| eyre::eyre!("no block explorer configured"))?;
        if let Err(e) = explorer::open_url_new_tab(&url) {
            warn!(error = %e, %url, "could not open block explorer");
            return Err(e);
        }
        Ok(url)
    }
}
