pub mod config;
pub mod eip1193;
pub mod session_store;
mod simulated;

pub use config::{RuntimeProfile, WalletAdapterConfig};
pub use eip1193::Eip1193Adapter;
#[cfg(target_arch = "wasm32")]
pub use session_store::BrowserSessionStore;
#[cfg(not(target_arch = "wasm32"))]
pub use session_store::FileSessionStore;
pub use session_store::{MemorySessionStore, SessionStore};
pub use simulated::DEFAULT_ACCOUNT;
