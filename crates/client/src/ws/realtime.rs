//! Realtime update subscriptions.
//!
//! A [`RealtimeSubscription`] binds one server event (optionally scoped to a
//! room) to a callback for as long as the subscription value lives. Payloads
//! are handed over raw: no validation, ordering or dedup. Consumers are
//! expected to re-fetch canonical state rather than trust the payload.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;

use super::connection::SocketConnection;
use super::debounce::Debouncer;
use super::listeners::ListenerHandle;
use super::manager::SocketManager;

/// Bounded retry for attaching to a socket that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = try once).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub delay: Duration,
    /// Growth factor applied to `delay` for each further retry.
    pub backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    /// One retry after one second.
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_millis(1000),
            backoff_multiplier: 1.0,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = f64::from(self.backoff_multiplier.max(0.0)).powi(retry as i32);
        Duration::from_millis((self.delay.as_millis() as f64 * factor).round() as u64)
    }
}

#[derive(Debug, Clone)]
pub struct RealtimeOptions {
    pub event: String,
    pub room: Option<String>,
    pub enabled: bool,
    pub debounce: Option<Duration>,
    pub retry: RetryPolicy,
}

impl RealtimeOptions {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            room: None,
            enabled: true,
            debounce: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn debounce(mut self, interval: Duration) -> Self {
        self.debounce = Some(interval);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Default)]
struct Attachment {
    connection: Option<Arc<SocketConnection>>,
    listener: Option<ListenerHandle>,
    /// Set once the subscription is dropped; no attach may happen after.
    cancelled: bool,
}

fn lock(attachment: &Mutex<Attachment>) -> MutexGuard<'_, Attachment> {
    attachment.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A live event subscription. Dropping it removes the listener, leaves the
/// room and cancels any pending retry or debounce timer.
#[must_use = "the subscription ends when this value is dropped"]
pub struct RealtimeSubscription {
    options: RealtimeOptions,
    attachment: Arc<Mutex<Attachment>>,
    attempts: Arc<AtomicU32>,
    retry_task: Option<JoinHandle<()>>,
    _debouncer: Option<Arc<Debouncer>>,
}

impl RealtimeSubscription {
    pub fn event(&self) -> &str {
        &self.options.event
    }

    /// Whether a listener is currently registered on a socket.
    pub fn is_attached(&self) -> bool {
        lock(&self.attachment).listener.is_some()
    }

    /// How many times attaching has been tried so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        let mut attachment = lock(&self.attachment);
        attachment.cancelled = true;
        if let Some(task) = self.retry_task.take() {
            task.abort();
        }
        attachment.listener.take();
        if let (Some(connection), Some(room)) = (attachment.connection.take(), &self.options.room) {
            connection.leave_room(room);
        }
    }
}

/// Subscribe `callback` to `options.event` on the manager's socket.
///
/// Must be called inside a tokio runtime: retries and debouncing run as
/// tasks.
pub fn subscribe<F>(manager: &SocketManager, options: RealtimeOptions, callback: F) -> RealtimeSubscription
where
    F: Fn(Value) + Send + Sync + 'static,
{
    let attachment = Arc::new(Mutex::new(Attachment::default()));
    let attempts = Arc::new(AtomicU32::new(0));

    if !options.enabled {
        return RealtimeSubscription {
            options,
            attachment,
            attempts,
            retry_task: None,
            _debouncer: None,
        };
    }

    let callback: Arc<dyn Fn(Value) + Send + Sync> = Arc::new(callback);
    let debouncer = options
        .debounce
        .map(|interval| Arc::new(Debouncer::new(interval, callback.clone())));

    let deliver: Arc<dyn Fn(&Value) + Send + Sync> = match &debouncer {
        Some(debouncer) => {
            let debouncer = Arc::downgrade(debouncer);
            Arc::new(move |payload: &Value| {
                if let Some(debouncer) = debouncer.upgrade() {
                    debouncer.push(payload.clone());
                }
            })
        }
        None => Arc::new(move |payload: &Value| callback(payload.clone())),
    };

    let attached = try_attach(manager, &options, &deliver, &attachment, &attempts);

    let retry_task = if attached || options.retry.max_retries == 0 {
        if !attached {
            crate::log_warn!("Realtime: no socket for '{}', not retrying", options.event);
        }
        None
    } else {
        let manager = manager.clone();
        let options_for_task = options.clone();
        let attachment = attachment.clone();
        let attempts = attempts.clone();

        Some(tokio::spawn(async move {
            for retry in 0..options_for_task.retry.max_retries {
                tokio::time::sleep(options_for_task.retry.delay_for_retry(retry)).await;
                if lock(&attachment).cancelled {
                    return;
                }
                if try_attach(&manager, &options_for_task, &deliver, &attachment, &attempts) {
                    return;
                }
            }
            crate::log_warn!(
                "Realtime: giving up on '{}' after {} attempt(s)",
                options_for_task.event,
                options_for_task.retry.max_retries + 1
            );
        }))
    };

    RealtimeSubscription {
        options,
        attachment,
        attempts,
        retry_task,
        _debouncer: debouncer,
    }
}

fn try_attach(
    manager: &SocketManager,
    options: &RealtimeOptions,
    deliver: &Arc<dyn Fn(&Value) + Send + Sync>,
    attachment: &Mutex<Attachment>,
    attempts: &AtomicU32,
) -> bool {
    // Held until the listener is stored so a concurrent drop sees either
    // nothing or the full attachment.
    let mut attachment = lock(attachment);
    if attachment.cancelled {
        return false;
    }
    attempts.fetch_add(1, Ordering::SeqCst);

    let Some(connection) = manager.current() else {
        crate::log_warn!("Realtime: socket not available for '{}'", options.event);
        return false;
    };

    if let Some(room) = &options.room {
        if let Err(e) = connection.join_room(room) {
            crate::log_warn!("Realtime: failed to join room '{}': {}", room, e);
        }
    }

    let deliver = deliver.clone();
    let listener = connection.on(&options.event, move |payload| deliver(payload));

    attachment.listener = Some(listener);
    attachment.connection = Some(connection);
    crate::log_debug!("Realtime: attached to '{}'", options.event);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::SocketConfig;
    use coursehub_shared::SocketFrame;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn idle_connection() -> SocketConnection {
        SocketConnection::new(SocketConfig::new("ws://127.0.0.1:9"))
    }

    fn counting() -> (Arc<AtomicUsize>, impl Fn(Value) + Send + Sync + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_for_cb = hits.clone();
        (hits, move |_: Value| {
            hits_for_cb.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn attaches_immediately_when_socket_exists() {
        let manager = SocketManager::new();
        let conn = manager.install(idle_connection());
        let (hits, callback) = counting();

        let sub = subscribe(
            &manager,
            RealtimeOptions::new("attendance_marked").room("attendance_updates"),
            callback,
        );
        assert!(sub.is_attached());
        assert_eq!(sub.attempts(), 1);
        assert!(conn.joined_rooms().contains("attendance_updates"));

        conn.deliver(&SocketFrame::new("attendance_marked", json!({"id": 1})));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        drop(sub);
        assert_eq!(conn.listener_count("attendance_marked"), 0);
        assert!(conn.joined_rooms().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_once_after_a_second() {
        let manager = SocketManager::new();
        let (_hits, callback) = counting();
        let sub = subscribe(
            &manager,
            RealtimeOptions::new("schedule_event_updated").room("timetable_updates"),
            callback,
        );
        assert!(!sub.is_attached());

        tokio::time::sleep(Duration::from_millis(500)).await;
        let conn = manager.install(idle_connection());
        assert!(!sub.is_attached());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(sub.is_attached());
        assert_eq!(sub.attempts(), 2);
        assert_eq!(conn.listener_count("schedule_event_updated"), 1);
        assert!(conn.joined_rooms().contains("timetable_updates"));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_the_single_retry() {
        let manager = SocketManager::new();
        let (_hits, callback) = counting();
        let sub = subscribe(&manager, RealtimeOptions::new("attendance_updated"), callback);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let conn = manager.install(idle_connection());
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(!sub.is_attached());
        assert_eq!(sub.attempts(), 2);
        assert_eq!(conn.listener_count("attendance_updated"), 0);
    }

    #[tokio::test]
    async fn dropping_one_subscription_keeps_the_other() {
        let manager = SocketManager::new();
        let conn = manager.install(idle_connection());
        let (hits_a, cb_a) = counting();
        let (hits_b, cb_b) = counting();

        let a = subscribe(&manager, RealtimeOptions::new("state-update"), cb_a);
        let _b = subscribe(&manager, RealtimeOptions::new("state-update"), cb_b);

        let frame = SocketFrame::new("state-update", json!({}));
        assert_eq!(conn.deliver(&frame), 2);

        a.unsubscribe();
        assert_eq!(conn.listener_count("state-update"), 1);
        conn.deliver(&frame);

        assert_eq!(hits_a.load(Ordering::SeqCst), 1);
        assert_eq!(hits_b.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_subscription_does_nothing() {
        let manager = SocketManager::new();
        let conn = manager.install(idle_connection());
        let (_hits, callback) = counting();

        let sub = subscribe(
            &manager,
            RealtimeOptions::new("attendance_marked").room("attendance_updates").enabled(false),
            callback,
        );
        assert!(!sub.is_attached());
        assert_eq!(sub.attempts(), 0);
        assert!(conn.joined_rooms().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_burst_calls_back_once() {
        let manager = SocketManager::new();
        let conn = manager.install(idle_connection());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_for_cb = seen.clone();

        let _sub = subscribe(
            &manager,
            RealtimeOptions::new("attendance_marked").debounce(Duration::from_millis(300)),
            move |payload| seen_for_cb.lock().unwrap().push(payload),
        );

        for id in 0..5 {
            conn.deliver(&SocketFrame::new("attendance_marked", json!({ "id": id })));
        }
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(*seen.lock().unwrap(), vec![json!({"id": 4})]);
    }

    #[tokio::test]
    async fn attach_after_drop_leaves_no_room_behind() {
        let manager = SocketManager::new();
        let conn = manager.install(idle_connection());
        let options = RealtimeOptions::new("schedule_event_created").room("timetable_updates");
        let deliver: Arc<dyn Fn(&Value) + Send + Sync> = Arc::new(|_: &Value| {});
        let attachment = Mutex::new(Attachment {
            cancelled: true,
            ..Attachment::default()
        });
        let attempts = AtomicU32::new(0);

        assert!(!try_attach(&manager, &options, &deliver, &attachment, &attempts));
        assert!(conn.joined_rooms().is_empty());
        assert_eq!(conn.listener_count("schedule_event_created"), 0);
        assert!(lock(&attachment).listener.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_during_retry_wait_never_joins() {
        let manager = SocketManager::new();
        let (_hits, callback) = counting();
        let sub = subscribe(
            &manager,
            RealtimeOptions::new("schedule_event_created").room("timetable_updates"),
            callback,
        );
        let conn = manager.install(idle_connection());
        drop(sub);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(conn.joined_rooms().is_empty());
        assert_eq!(conn.listener_count("schedule_event_created"), 0);
    }

    #[test]
    fn retry_policy_delays() {
        let policy = RetryPolicy {
            max_retries: 3,
            delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        };
        assert_eq!(policy.delay_for_retry(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(400));
        assert_eq!(RetryPolicy::default().delay_for_retry(0), Duration::from_secs(1));
    }
}
