//! Parcero wallet shell: the consumer-facing surface over the wallet crates.

pub mod bridge;
pub mod explorer;

pub use bridge::WalletBridge;
