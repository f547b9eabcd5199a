//! Trailing-edge debounce for event payloads.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Collapses bursts of payloads into one call carrying the latest payload,
/// made once `delay` passes without a new one.
///
/// A pending call is dropped, not flushed, when the debouncer goes away.
pub struct Debouncer {
    tx: mpsc::UnboundedSender<Value>,
    task: AbortHandle,
}

impl Debouncer {
    /// Must be called inside a tokio runtime.
    pub fn new(delay: Duration, callback: Arc<dyn Fn(Value) + Send + Sync>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

        let task = tokio::spawn(async move {
            while let Some(mut latest) = rx.recv().await {
                loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(payload) => latest = payload,
                            None => return,
                        },
                        _ = tokio::time::sleep(delay) => {
                            callback(latest);
                            break;
                        }
                    }
                }
            }
        });

        Self {
            tx,
            task: task.abort_handle(),
        }
    }

    pub fn push(&self, payload: Value) {
        // Only fails once the task has been aborted.
        let _ = self.tx.send(payload);
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
