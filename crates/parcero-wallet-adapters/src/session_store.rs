use std::collections::BTreeMap;
use std::sync::Mutex;

use parcero_wallet_core::{SessionStorePort, StoreError};

use crate::WalletAdapterConfig;

/// Process-lifetime store; the opt-out flag is forgotten on exit.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    fn items(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.items
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStorePort for MemorySessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items().remove(key);
        Ok(())
    }
}

/// Keeps items in a flat JSON object on disk, rewritten on every change.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileSessionStore {
    path: std::path::PathBuf,
    lock: Mutex<()>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileSessionStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StoreError::Io(format!("{}: {e}", self.path.display()))),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("{}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| StoreError::Corrupt(format!("serialize session: {e}")))?;
        std::fs::write(&self.path, json)
            .map_err(|e| StoreError::Io(format!("{}: {e}", self.path.display())))
    }

    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StoreError> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut items = self.load()?;
        if change(&mut items) {
            self.save(&items)?;
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SessionStorePort for FileSessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(self.load()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|items| {
            items.insert(key.to_owned(), value.to_owned()).as_deref() != Some(value)
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.update(|items| items.remove(key).is_some())
    }
}

/// `window.localStorage`, so the opt-out survives page reloads.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct BrowserSessionStore;

#[cfg(target_arch = "wasm32")]
impl BrowserSessionStore {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("missing window".to_owned()))?
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("localStorage access denied: {e:?}")))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_owned()))
    }
}

#[cfg(target_arch = "wasm32")]
impl SessionStorePort for BrowserSessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StoreError::Io(format!("localStorage read failed: {e:?}")))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::Io(format!("localStorage write failed: {e:?}")))
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StoreError::Io(format!("localStorage remove failed: {e:?}")))
    }
}

/// Store picked from configuration: localStorage in the browser, a JSON file
/// natively when one is configured, memory otherwise.
#[derive(Debug)]
pub enum SessionStore {
    Memory(MemorySessionStore),
    #[cfg(not(target_arch = "wasm32"))]
    File(FileSessionStore),
    #[cfg(target_arch = "wasm32")]
    Browser(BrowserSessionStore),
}

impl SessionStore {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_config(config: &WalletAdapterConfig) -> Self {
        match &config.session_file {
            Some(path) => Self::File(FileSessionStore::new(path.clone())),
            None => Self::Memory(MemorySessionStore::default()),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn from_config(_config: &WalletAdapterConfig) -> Self {
        Self::Browser(BrowserSessionStore)
    }

    fn inner(&self) -> &dyn SessionStorePort {
        match self {
            Self::Memory(store) => store,
            #[cfg(not(target_arch = "wasm32"))]
            Self::File(store) => store,
            #[cfg(target_arch = "wasm32")]
            Self::Browser(store) => store,
        }
    }
}

impl SessionStorePort for SessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner().get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner().set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.inner().remove_item(key)
    }
}
