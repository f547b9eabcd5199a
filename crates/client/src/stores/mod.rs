//! The application store.
//!
//! One [`AppState`] behind a mutex. Every [`Action`] goes through the pure
//! [`reduce`] function and the resulting snapshot is published on a watch
//! channel, so readers never hold the lock.

pub mod actions;
pub mod reducer;
pub mod state;

pub use actions::Action;
pub use reducer::reduce;
pub use state::{AppState, AuthState, ListSlice};

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::storage::FileStorage;

struct Persistence {
    storage: FileStorage,
    key: String,
}

struct StoreInner {
    state: Mutex<AppState>,
    tx: watch::Sender<AppState>,
    persistence: Option<Persistence>,
}

/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self::build(state, None)
    }

    /// A store whose auth slice is written to `storage` under `key` whenever
    /// a login or logout goes through.
    pub fn with_persistence(state: AppState, storage: FileStorage, key: impl Into<String>) -> Self {
        Self::build(
            state,
            Some(Persistence {
                storage,
                key: key.into(),
            }),
        )
    }

    fn build(state: AppState, persistence: Option<Persistence>) -> Self {
        let (tx, _) = watch::channel(state.clone());
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(state),
                tx,
                persistence,
            }),
        }
    }

    pub fn dispatch(&self, action: Action) {
        crate::log_debug!("store: dispatch {}", action_name(&action));
        let persist = action.changes_auth();

        let snapshot = {
            let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
            let next = reduce(std::mem::take(&mut *state), action);
            *state = next.clone();
            // Published under the lock so subscribers see snapshots in dispatch order.
            self.inner.tx.send_replace(next.clone());
            next
        };

        if persist {
            self.persist_auth(&snapshot.auth);
        }
    }

    pub fn state(&self) -> AppState {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.inner.tx.subscribe()
    }

    /// Restore the persisted auth slice. Returns `true` if one was found.
    pub fn rehydrate(&self) -> bool {
        let Some(persistence) = &self.inner.persistence else {
            return false;
        };
        match persistence.storage.load::<AuthState>(&persistence.key) {
            Some(auth) => {
                crate::log_info!("store: restored session for {:?}", auth.user.as_ref().map(|u| &u.email));
                self.dispatch(Action::AuthRehydrated(auth));
                true
            }
            None => false,
        }
    }

    fn persist_auth(&self, auth: &AuthState) {
        let Some(persistence) = &self.inner.persistence else {
            return;
        };
        if auth.is_authenticated() {
            persistence.storage.save(&persistence.key, auth);
        } else {
            persistence.storage.remove(&persistence.key);
        }
    }
}

fn action_name(action: &Action) -> String {
    serde_json::to_value(action)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}
