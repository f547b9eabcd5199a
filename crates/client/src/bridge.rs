//! Wiring from server socket events to store updates.
//!
//! ```text
//!   attendance_marked ─┐                          ┌─> GET /attendance
//!   attendance_updated ┴─ room attendance_updates ┘   (debounced)
//!
//!   schedule_event_* ──── room timetable_updates ───> GET /schedule
//!                                                     (debounced)
//!
//!   state-update ─────────────────────────────────> Store::dispatch
//! ```

use std::time::Duration;

use coursehub_shared::{events, rooms};
use serde_json::Value;
use tokio::runtime::Handle;

use crate::api_client::ApiClient;
use crate::stores::{Action, Store};
use crate::thunks;
use crate::ws::{subscribe, RealtimeOptions, RealtimeSubscription, SocketManager};

/// Quiet period before a burst of change events turns into one re-fetch.
pub const DEFAULT_REFETCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// The standard set of realtime subscriptions. Dropping it unsubscribes all.
pub struct RealtimeBridge {
    subscriptions: Vec<RealtimeSubscription>,
}

impl RealtimeBridge {
    /// Must be called inside a tokio runtime.
    pub fn start(manager: &SocketManager, store: &Store, api: &ApiClient) -> Self {
        Self::start_with_debounce(manager, store, api, DEFAULT_REFETCH_DEBOUNCE)
    }

    pub fn start_with_debounce(
        manager: &SocketManager,
        store: &Store,
        api: &ApiClient,
        debounce: Duration,
    ) -> Self {
        let runtime = Handle::current();
        let mut subscriptions = Vec::new();

        for event in [events::ATTENDANCE_MARKED, events::ATTENDANCE_UPDATED] {
            let (store, api, runtime) = (store.clone(), api.clone(), runtime.clone());
            subscriptions.push(subscribe(
                manager,
                RealtimeOptions::new(event)
                    .room(rooms::ATTENDANCE_UPDATES)
                    .debounce(debounce),
                move |_payload: Value| {
                    let (store, api) = (store.clone(), api.clone());
                    runtime.spawn(async move {
                        thunks::fetch_attendance(&store, &api).await;
                    });
                },
            ));
        }

        for event in [
            events::SCHEDULE_EVENT_CREATED,
            events::SCHEDULE_EVENT_UPDATED,
            events::SCHEDULE_EVENT_DELETED,
        ] {
            let (store, api, runtime) = (store.clone(), api.clone(), runtime.clone());
            subscriptions.push(subscribe(
                manager,
                RealtimeOptions::new(event)
                    .room(rooms::TIMETABLE_UPDATES)
                    .debounce(debounce),
                move |_payload: Value| {
                    let (store, api) = (store.clone(), api.clone());
                    runtime.spawn(async move {
                        thunks::fetch_schedule(&store, &api).await;
                    });
                },
            ));
        }

        let state_store = store.clone();
        subscriptions.push(subscribe(
            manager,
            RealtimeOptions::new(events::STATE_UPDATE),
            move |payload: Value| apply_state_update(&state_store, payload),
        ));

        crate::log_info!("RealtimeBridge: {} subscriptions registered", subscriptions.len());
        Self { subscriptions }
    }

    pub fn subscriptions(&self) -> &[RealtimeSubscription] {
        &self.subscriptions
    }
}

fn apply_state_update(store: &Store, payload: Value) {
    match serde_json::from_value::<Action>(payload) {
        Ok(action) => store.dispatch(action),
        Err(e) => crate::log_warn!("RealtimeBridge: ignoring state-update: {}", e),
    }
}
