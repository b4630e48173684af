use crate::ports::{SessionStorePort, StoreError};

/// Durable marker left by an explicit disconnect.
pub const LOGGED_OUT_KEY: &str = "userLoggedOut";
const LOGGED_OUT_VALUE: &str = "true";

pub fn is_logged_out<S: SessionStorePort + ?Sized>(store: &S) -> Result<bool, StoreError> {
    Ok(store.get_item(LOGGED_OUT_KEY)?.as_deref() == Some(LOGGED_OUT_VALUE))
}

pub fn mark_logged_out<S: SessionStorePort + ?Sized>(store: &S) -> Result<(), StoreError> {
    store.set_item(LOGGED_OUT_KEY, LOGGED_OUT_VALUE)
}

pub fn clear_logged_out<S: SessionStorePort + ?Sized>(store: &S) -> Result<(), StoreError> {
    store.remove_item(LOGGED_OUT_KEY)
}
