pub mod abi;
pub mod bridge;
pub mod chain;
pub mod domain;
pub mod lifecycle;
pub mod ports;
pub mod session;
pub mod state_machine;
pub mod view;

pub use abi::{decode_balance, encode_balance_query, DecodeError, BALANCE_OF_SELECTOR};
pub use bridge::ProviderBridge;
pub use chain::{ensure_chain, ChainOutcome};
pub use domain::{
    ConnectionState, ConnectionStatus, NativeCurrency, NetworkDescriptor, ProviderEvent,
    ProviderEventKind, TokenAmount, TokenContract, TokenInfo, WalletSettings,
};
pub use lifecycle::{Outcome, SkipReason, WalletError, WalletManager};
pub use ports::{ProviderError, ProviderPort, RpcMethod, SessionStorePort, StoreError};
pub use session::LOGGED_OUT_KEY;
pub use state_machine::{connection_transition, ConnectionAction, TransitionError};
pub use view::WalletView;
