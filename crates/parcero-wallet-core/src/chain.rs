use tracing::{debug, info};

use crate::bridge::ProviderBridge;
use crate::domain::NetworkDescriptor;
use crate::ports::{ProviderError, ProviderPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// The wallet was already on the required chain; nothing was sent.
    AlreadyActive,
    Switched,
    /// The wallet did not know the chain and accepted its registration.
    Added,
}

/// Bring the wallet onto `required`. A switch to an unregistered chain falls
/// back to a single add-chain request; every other failure is returned as is.
pub async fn ensure_chain<P: ProviderPort>(
    bridge: &ProviderBridge<P>,
    current: u64,
    required: &NetworkDescriptor,
) -> Result<ChainOutcome, ProviderError> {
    if current == required.chain_id {
        return Ok(ChainOutcome::AlreadyActive);
    }

    info!(current, required = required.chain_id, "wallet on wrong chain, requesting switch");
    match bridge.switch_chain(required.chain_id).await {
        Ok(()) => Ok(ChainOutcome::Switched),
        Err(ProviderError::ChainNotRegistered(reason)) => {
            debug!(%reason, chain = required.chain_id, "chain unknown to wallet, registering it");
            bridge.add_chain(required).await?;
            Ok(ChainOutcome::Added)
        }
        Err(e) => Err(e),
    }
}
