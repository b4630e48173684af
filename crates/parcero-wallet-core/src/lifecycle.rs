use std::sync::{Mutex, MutexGuard, PoisonError};

use alloy::primitives::Address;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::abi::{self, DecodeError};
use crate::bridge::{parse_chain_id_str, ProviderBridge};
use crate::chain::{self, ChainOutcome};
use crate::domain::{
    ConnectionState, ConnectionStatus, ProviderEventKind, TokenAmount, WalletSettings,
};
use crate::ports::{ProviderError, ProviderPort, SessionStorePort, StoreError};
use crate::session;
use crate::state_machine::{can_check, connection_transition, ConnectionAction, TransitionError};
use crate::view::WalletView;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("wallet authorized no accounts")]
    NoAccounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A check or connect is already outstanding.
    Busy,
    OptedOut,
    NotAllowed(ConnectionStatus),
    NotConnected,
    AlreadyStarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Skipped(SkipReason),
    /// The result arrived after the session it belonged to was torn down.
    Discarded,
}

#[derive(Debug, Default)]
struct Inner {
    state: ConnectionState,
    /// Bumped whenever the session is torn down; in-flight work tagged with an
    /// older epoch is dropped on completion.
    epoch: u64,
    started: bool,
}

/// Owns the connection record. All mutation goes through the operations
/// below; readers get snapshots.
pub struct WalletManager<P, S>
where
    P: ProviderPort,
    S: SessionStorePort,
{
    bridge: ProviderBridge<P>,
    store: S,
    settings: WalletSettings,
    inner: Mutex<Inner>,
}

impl<P, S> WalletManager<P, S>
where
    P: ProviderPort,
    S: SessionStorePort,
{
    pub fn new(provider: P, store: S, settings: WalletSettings) -> Self {
        Self {
            bridge: ProviderBridge::new(provider),
            store,
            settings,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn provider(&self) -> &P {
        self.bridge.provider()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &WalletSettings {
        &self.settings
    }

    pub fn state(&self) -> ConnectionState {
        self.inner().state.clone()
    }

    pub fn view(&self) -> WalletView {
        WalletView::project(&self.inner().state, &self.settings)
    }

    /// Startup policy: silently restore an authorized session exactly once,
    /// unless the user explicitly logged out last time.
    pub async fn start(&self) -> Result<Outcome, WalletError> {
        {
            let mut g = self.inner();
            if g.started {
                return Ok(Outcome::Skipped(SkipReason::AlreadyStarted));
            }
            g.started = true;
        }
        self.check_connection().await
    }

    /// Look for an already-authorized account without prompting the user.
    pub async fn check_connection(&self) -> Result<Outcome, WalletError> {
        let epoch = {
            let mut g = self.inner();
            if g.state.is_loading {
                return Ok(Outcome::Skipped(SkipReason::Busy));
            }
            if !can_check(g.state.status) {
                return Ok(Outcome::Skipped(SkipReason::NotAllowed(g.state.status)));
            }
            if session::is_logged_out(&self.store)? {
                info!("opt-out flag set, skipping silent reconnect");
                return Ok(Outcome::Skipped(SkipReason::OptedOut));
            }
            Self::begin(&mut g)?;
            g.epoch
        };

        let result = self.probe_authorized().await;

        let account = {
            let mut g = self.inner();
            if g.epoch != epoch {
                debug!("session reset during connection check, dropping result");
                return Ok(Outcome::Discarded);
            }
            g.state.is_loading = false;
            match result {
                Ok(Some((account, chain_id))) => {
                    self.settle_connected(&mut g, account, chain_id)?;
                    info!(%account, chain_id, "restored authorized wallet session");
                    account
                }
                Ok(None) => {
                    Self::apply(&mut g, ConnectionAction::NoAccounts)?;
                    debug!("no authorized account");
                    return Ok(Outcome::Completed);
                }
                Err(e) => {
                    Self::settle_failed(&mut g, &e)?;
                    return Err(e);
                }
            }
        };

        self.load_balance(epoch, account).await;
        Ok(Outcome::Completed)
    }

    /// Ask the user for account access and enforce the required chain.
    /// Ignored while another check/connect is in flight.
    pub async fn connect_wallet(&self) -> Result<Outcome, WalletError> {
        let epoch = {
            let mut g = self.inner();
            if g.state.is_loading {
                debug!("connect ignored, another attempt is in flight");
                return Ok(Outcome::Skipped(SkipReason::Busy));
            }
            Self::begin(&mut g)?;
            g.epoch
        };

        info!("requesting wallet authorization");
        let result = self.authorize().await;

        let account = {
            let mut g = self.inner();
            if g.epoch != epoch {
                info!("wallet disconnected while connect was pending, dropping result");
                return Ok(Outcome::Discarded);
            }
            g.state.is_loading = false;
            match result {
                Ok((account, chain_id)) => {
                    self.settle_connected(&mut g, account, chain_id)?;
                    if let Err(e) = session::clear_logged_out(&self.store) {
                        warn!(error = %e, "failed to clear opt-out flag");
                    }
                    info!(%account, chain_id, "wallet connected");
                    account
                }
                Err(e) => {
                    Self::settle_failed(&mut g, &e)?;
                    warn!(error = %e, "wallet connection failed");
                    return Err(e);
                }
            }
        };

        self.load_balance(epoch, account).await;
        Ok(Outcome::Completed)
    }

    /// Reset to `Disconnected` immediately, whatever is in flight, and
    /// remember the choice so the next start does not reconnect silently.
    pub fn disconnect_wallet(&self) -> Result<(), WalletError> {
        {
            let mut g = self.inner();
            Self::reset(&mut g)?;
        }
        info!("wallet disconnected");
        session::mark_logged_out(&self.store).map_err(|e| {
            warn!(error = %e, "failed to persist opt-out flag");
            WalletError::from(e)
        })
    }

    /// Re-read the token balance. On failure the previous balance stays.
    pub async fn refresh_balance(&self) -> Result<Outcome, WalletError> {
        let (epoch, account) = {
            let g = self.inner();
            match (g.state.status, g.state.account) {
                (ConnectionStatus::Connected, Some(account)) => (g.epoch, account),
                _ => return Ok(Outcome::Skipped(SkipReason::NotConnected)),
            }
        };

        match self.fetch_balance(account).await {
            Ok(amount) => Ok(self.store_balance(epoch, account, amount)),
            Err(e) => {
                warn!(error = %e, %account, "balance refresh failed, keeping previous balance");
                Err(e)
            }
        }
    }

    /// Apply `accountsChanged` / `chainChanged` notifications queued by the
    /// provider since the last call.
    pub async fn sync_provider_events(&self) -> Result<Outcome, WalletError> {
        let events = self.bridge.drain_events()?;
        if events.is_empty() {
            return Ok(Outcome::Completed);
        }

        let mut refetch = None;
        let epoch = {
            let mut g = self.inner();
            if !g.state.is_connected() {
                debug!(count = events.len(), "ignoring provider events while not connected");
                return Ok(Outcome::Skipped(SkipReason::NotConnected));
            }
            for event in events {
                if !g.state.is_connected() {
                    break;
                }
                match event.kind {
                    ProviderEventKind::AccountsChanged => {
                        let accounts: Vec<Address> = match serde_json::from_str(&event.value) {
                            Ok(accounts) => accounts,
                            Err(e) => {
                                warn!(error = %e, seq = event.sequence, "malformed accountsChanged payload");
                                continue;
                            }
                        };
                        match accounts.first().copied() {
                            None => {
                                Self::reset(&mut g)?;
                                refetch = None;
                                info!("wallet revoked account access");
                            }
                            Some(account) if g.state.account != Some(account) => {
                                g.state.account = Some(account);
                                g.state.token_info = Some(self.settings.token.base_info());
                                refetch = Some(account);
                                info!(%account, "wallet switched account");
                            }
                            Some(_) => {}
                        }
                    }
                    ProviderEventKind::ChainChanged => match parse_chain_id_str(&event.value) {
                        Ok(chain_id) => {
                            g.state.chain_id = Some(chain_id);
                            if chain_id != self.settings.network.chain_id {
                                warn!(chain_id, required = self.settings.network.chain_id, "wallet moved off the required chain");
                            }
                        }
                        Err(e) => warn!(error = %e, seq = event.sequence, "malformed chainChanged payload"),
                    },
                }
            }
            g.epoch
        };

        if let Some(account) = refetch {
            self.load_balance(epoch, account).await;
        }
        Ok(Outcome::Completed)
    }

    async fn probe_authorized(&self) -> Result<Option<(Address, u64)>, WalletError> {
        let accounts = self.bridge.accounts().await?;
        let Some(account) = accounts.first().copied() else {
            return Ok(None);
        };
        let chain_id = self.bridge.chain_id().await?;
        Ok(Some((account, chain_id)))
    }

    async fn authorize(&self) -> Result<(Address, u64), WalletError> {
        let accounts = self.bridge.request_accounts().await?;
        let account = accounts.first().copied().ok_or(WalletError::NoAccounts)?;
        let current = self.bridge.chain_id().await?;
        let outcome = chain::ensure_chain(&self.bridge, current, &self.settings.network).await?;
        if outcome != ChainOutcome::AlreadyActive {
            info!(?outcome, chain_id = self.settings.network.chain_id, "wallet moved to required chain");
        }
        Ok((account, self.settings.network.chain_id))
    }

    async fn fetch_balance(&self, account: Address) -> Result<TokenAmount, WalletError> {
        let token = &self.settings.token;
        let raw = self.bridge.balance_of(token.address, account).await?;
        Ok(abi::decode_balance(&raw, token.decimals)?)
    }

    /// Balance read that follows a connection; failures never fail the connection.
    async fn load_balance(&self, epoch: u64, account: Address) {
        match self.fetch_balance(account).await {
            Ok(amount) => {
                self.store_balance(epoch, account, amount);
            }
            Err(e) => warn!(error = %e, %account, "token balance unavailable"),
        }
    }

    fn store_balance(&self, epoch: u64, account: Address, amount: TokenAmount) -> Outcome {
        let mut g = self.inner();
        if g.epoch != epoch || !g.state.is_connected() || g.state.account != Some(account) {
            debug!(%account, "dropping balance for superseded session");
            return Outcome::Discarded;
        }
        if let Some(info) = g.state.token_info.as_mut() {
            info.balance = Some(amount);
        }
        debug!(%account, balance = %amount, "token balance updated");
        Outcome::Completed
    }

    fn begin(g: &mut Inner) -> Result<(), WalletError> {
        Self::apply(g, ConnectionAction::Begin)?;
        g.state.is_loading = true;
        g.state.error = None;
        g.state.account = None;
        g.state.chain_id = None;
        g.state.token_info = None;
        Ok(())
    }

    fn settle_connected(
        &self,
        g: &mut Inner,
        account: Address,
        chain_id: u64,
    ) -> Result<(), WalletError> {
        Self::apply(g, ConnectionAction::Authorized)?;
        g.state.account = Some(account);
        g.state.chain_id = Some(chain_id);
        g.state.token_info = Some(self.settings.token.base_info());
        Ok(())
    }

    fn settle_failed(g: &mut Inner, err: &WalletError) -> Result<(), WalletError> {
        Self::apply(g, ConnectionAction::Fail)?;
        g.state.error = Some(err.to_string());
        g.state.account = None;
        g.state.chain_id = None;
        g.state.token_info = None;
        Ok(())
    }

    fn reset(g: &mut Inner) -> Result<(), WalletError> {
        Self::apply(g, ConnectionAction::Reset)?;
        g.epoch = g.epoch.wrapping_add(1);
        g.state = ConnectionState::default();
        Ok(())
    }

    fn apply(g: &mut Inner, action: ConnectionAction) -> Result<(), WalletError> {
        let from = g.state.status;
        let (to, reason) = connection_transition(from, action)?;
        debug!(?from, ?to, reason, "connection transition");
        g.state.status = to;
        Ok(())
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        // Nothing panics while the lock is held, so a poisoned guard still
        // holds a consistent record.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
