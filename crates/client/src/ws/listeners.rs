//! Per-event listener table shared by a socket connection.
//!
//! Every registration is independent: two listeners for the same event are
//! both called, and removing one leaves the other alone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde_json::Value;

pub type EventCallback = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Default)]
struct Table {
    next_id: u64,
    by_event: HashMap<String, Vec<(u64, EventCallback)>>,
}

fn lock(table: &Mutex<Table>) -> MutexGuard<'_, Table> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct ListenerRegistry {
    table: Arc<Mutex<Table>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event`. The listener lives until the returned
    /// handle is dropped or `off()` is called on it.
    pub fn add<F>(&self, event: &str, callback: F) -> ListenerHandle
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut table = lock(&self.table);
        table.next_id += 1;
        let id = table.next_id;
        table
            .by_event
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(callback)));

        ListenerHandle {
            table: Arc::downgrade(&self.table),
            event: event.to_string(),
            id,
        }
    }

    /// Call every listener for `event` with `payload`. Returns how many ran.
    ///
    /// Callbacks run outside the table lock, so a callback may register or
    /// remove listeners.
    pub fn dispatch(&self, event: &str, payload: &Value) -> usize {
        let callbacks: Vec<EventCallback> = {
            let table = lock(&self.table);
            match table.by_event.get(event) {
                Some(list) => list.iter().map(|(_, cb)| cb.clone()).collect(),
                None => return 0,
            }
        };

        for callback in &callbacks {
            callback(payload);
        }
        callbacks.len()
    }

    pub fn count(&self, event: &str) -> usize {
        lock(&self.table).by_event.get(event).map_or(0, Vec::len)
    }
}

/// Removes its listener when dropped.
#[must_use = "dropping the handle removes the listener"]
pub struct ListenerHandle {
    table: Weak<Mutex<Table>>,
    event: String,
    id: u64,
}

impl ListenerHandle {
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Remove the listener now.
    pub fn off(self) {
        drop(self);
    }

    fn remove(&self) {
        let Some(table) = self.table.upgrade() else {
            return;
        };
        let mut table = lock(&table);
        if let Some(list) = table.by_event.get_mut(&self.event) {
            list.retain(|(id, _)| *id != self.id);
            if list.is_empty() {
                table.by_event.remove(&self.event);
            }
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.remove();
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("event", &self.event)
            .field("id", &self.id)
            .finish()
    }
}
