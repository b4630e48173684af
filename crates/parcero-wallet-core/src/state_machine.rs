use thiserror::Error;

use crate::domain::ConnectionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    Begin,
    Authorized,
    NoAccounts,
    Fail,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal connection transition: {from:?} --{action:?}-->")]
pub struct TransitionError {
    pub from: ConnectionStatus,
    pub action: ConnectionAction,
}

pub fn connection_transition(
    from: ConnectionStatus,
    action: ConnectionAction,
) -> Result<(ConnectionStatus, &'static str), TransitionError> {
    use ConnectionAction as A;
    use ConnectionStatus as S;

    let next = match (from, action) {
        (_, A::Reset) => (S::Disconnected, "reset"),
        (S::Disconnected, A::Begin) => (S::Connecting, "attempt from disconnected"),
        (S::Failed, A::Begin) => (S::Connecting, "retry after failure"),
        (S::Connected, A::Begin) => (S::Connecting, "reconnect"),
        (S::Connecting, A::Authorized) => (S::Connected, "account authorized"),
        (S::Connecting, A::NoAccounts) => (S::Disconnected, "no authorized account"),
        (S::Connecting, A::Fail) => (S::Failed, "attempt failed"),
        _ => return Err(TransitionError { from, action }),
    };
    Ok(next)
}

/// Statuses `check_connection` may start from.
pub fn can_check(from: ConnectionStatus) -> bool {
    matches!(from, ConnectionStatus::Disconnected | ConnectionStatus::Failed)
}
