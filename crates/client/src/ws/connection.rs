//! Socket connection with status tracking, room bookkeeping and auto-reconnect.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use coursehub_shared::SocketFrame;
use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::listeners::{ListenerHandle, ListenerRegistry};

/// Connection status of the shared socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error { reason: String },
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SocketError {
    #[error("room id must not be empty")]
    InvalidRoom,
    #[error("socket connection has shut down")]
    Closed,
}

/// Configuration for auto-reconnect behavior
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of reconnect attempts (0 = infinite)
    pub max_attempts: u32,
    /// Initial delay in milliseconds
    pub initial_delay_ms: u32,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u32,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 1.5,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_ms as f32 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis((delay as u32).min(self.max_delay_ms) as u64)
    }
}

#[derive(Debug, Clone)]
pub struct SocketConfig {
    pub url: String,
    pub reconnect: ReconnectConfig,
}

impl SocketConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// State shared between the connection object and its background loop.
struct Shared {
    status: watch::Sender<ConnectionStatus>,
    rooms: Mutex<HashSet<String>>,
    listeners: ListenerRegistry,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
    }

    /// Flip to connected and snapshot the rooms to announce.
    ///
    /// Runs under the room lock so a concurrent `join_room` either lands in
    /// the snapshot or sees the connected status and sends its own frame.
    fn mark_connected(&self) -> Vec<String> {
        let rooms = lock(&self.rooms);
        self.set_status(ConnectionStatus::Connected);
        rooms.iter().cloned().collect()
    }
}

/// The client's one socket connection.
///
/// Created idle; `start()` spawns the connection loop on the current tokio
/// runtime. Room membership and listeners can be set up before, during and
/// after connecting.
pub struct SocketConnection {
    config: SocketConfig,
    shared: Arc<Shared>,
    sender: UnboundedSender<SocketFrame>,
    receiver: Mutex<Option<UnboundedReceiver<SocketFrame>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SocketConnection {
    pub fn new(config: SocketConfig) -> Self {
        let (sender, receiver) = unbounded();
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);

        Self {
            config,
            shared: Arc::new(Shared {
                status,
                rooms: Mutex::new(HashSet::new()),
                listeners: ListenerRegistry::new(),
            }),
            sender,
            receiver: Mutex::new(Some(receiver)),
            task: Mutex::new(None),
        }
    }

    /// Spawn the connection loop. Returns false if it was already started.
    pub fn start(&self) -> bool {
        let Some(receiver) = lock(&self.receiver).take() else {
            return false;
        };

        let handle = tokio::spawn(run_connection_loop(
            self.config.url.clone(),
            self.config.reconnect.clone(),
            self.shared.clone(),
            receiver,
        ));
        *lock(&self.task) = Some(handle);
        true
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn is_connected(&self) -> bool {
        self.shared.status.borrow().is_connected()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.shared.status.borrow().clone()
    }

    /// Observe status changes.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Ask the server for events broadcast to `room`.
    ///
    /// Returns whether the room was newly joined. While disconnected the room
    /// is only recorded; it is announced once the connection is up.
    pub fn join_room(&self, room: &str) -> Result<bool, SocketError> {
        let room = room.trim();
        if room.is_empty() {
            return Err(SocketError::InvalidRoom);
        }

        let mut rooms = lock(&self.shared.rooms);
        let inserted = rooms.insert(room.to_string());
        if inserted && self.is_connected() {
            self.sender
                .unbounded_send(SocketFrame::join_room(room))
                .map_err(|_| SocketError::Closed)?;
        }
        if inserted {
            crate::log_debug!("Joined room {}", room);
        }
        Ok(inserted)
    }

    /// Stop receiving `room` broadcasts. Leaving a room that was never joined
    /// is a no-op and returns false.
    pub fn leave_room(&self, room: &str) -> bool {
        let room = room.trim();
        let mut rooms = lock(&self.shared.rooms);
        let removed = rooms.remove(room);
        if removed && self.is_connected() {
            if self.sender.unbounded_send(SocketFrame::leave_room(room)).is_err() {
                crate::log_debug!("Connection gone while leaving room {}", room);
            }
        }
        removed
    }

    pub fn joined_rooms(&self) -> HashSet<String> {
        lock(&self.shared.rooms).clone()
    }

    /// Register a raw event listener. It stays registered until the handle is
    /// dropped.
    pub fn on<F>(&self, event: &str, callback: F) -> ListenerHandle
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.shared.listeners.add(event, callback)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.shared.listeners.count(event)
    }

    /// Send a raw event. Frames sent while disconnected are buffered and
    /// flushed on the next connection.
    pub fn emit(&self, event: &str, data: Value) -> Result<(), SocketError> {
        self.sender
            .unbounded_send(SocketFrame::new(event, data))
            .map_err(|_| SocketError::Closed)
    }

    /// Hand a frame to the listeners as if it had arrived on the socket.
    pub fn deliver(&self, frame: &SocketFrame) -> usize {
        self.shared.listeners.dispatch(&frame.event, &frame.data)
    }

    /// Stop the connection loop for good.
    pub fn disconnect(&self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
            crate::log_info!("Socket to {} disconnected", self.config.url);
        }
        self.shared.set_status(ConnectionStatus::Disconnected);
    }
}

impl Drop for SocketConnection {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for SocketConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketConnection")
            .field("url", &self.config.url)
            .field("status", &self.connection_status())
            .finish()
    }
}

/// How a single live connection ended.
enum SessionEnd {
    /// The server or the network closed it; reconnect.
    Dropped,
    /// Every sender is gone; stop.
    Shutdown,
}

async fn run_connection_loop(
    url: String,
    reconnect: ReconnectConfig,
    shared: Arc<Shared>,
    mut receiver: UnboundedReceiver<SocketFrame>,
) {
    let mut attempt = 0u32;

    loop {
        shared.set_status(ConnectionStatus::Connecting);

        match connect_async(url.as_str()).await {
            Ok((ws_stream, _response)) => {
                attempt = 0;
                let rooms = shared.mark_connected();
                crate::log_info!("Socket connected to {}", url);

                let end = run_session(ws_stream, rooms, &shared, &mut receiver).await;
                shared.set_status(ConnectionStatus::Disconnected);
                crate::log_info!("Socket to {} closed", url);

                if let SessionEnd::Shutdown = end {
                    return;
                }
                tokio::time::sleep(reconnect.delay_for_attempt(0)).await;
            }
            Err(e) => {
                crate::log_error!("Socket error for {}: {}", url, e);

                if reconnect.max_attempts > 0 && attempt >= reconnect.max_attempts {
                    shared.set_status(ConnectionStatus::Error {
                        reason: format!(
                            "Max reconnect attempts ({}) exceeded",
                            reconnect.max_attempts
                        ),
                    });
                    return;
                }
                shared.set_status(ConnectionStatus::Error {
                    reason: e.to_string(),
                });

                let delay = reconnect.delay_for_attempt(attempt);
                crate::log_info!(
                    "Reconnecting to {} in {}ms (attempt {})",
                    url,
                    delay.as_millis(),
                    attempt + 1
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

async fn run_session<S>(
    ws_stream: tokio_tungstenite::WebSocketStream<S>,
    rooms: Vec<String>,
    shared: &Shared,
    receiver: &mut UnboundedReceiver<SocketFrame>,
) -> SessionEnd
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut write, mut read) = ws_stream.split();

    for room in rooms {
        if let Err(e) = send_frame(&mut write, &SocketFrame::join_room(&room)).await {
            crate::log_error!("Failed to announce room {}: {}", room, e);
            return SessionEnd::Dropped;
        }
    }

    loop {
        tokio::select! {
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<SocketFrame>(&text) {
                        Ok(frame) => {
                            let handled = shared.listeners.dispatch(&frame.event, &frame.data);
                            crate::log_debug!("Socket event {} -> {} listener(s)", frame.event, handled);
                        }
                        Err(e) => crate::log_error!("Failed to parse socket frame: {}", e),
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    crate::log_info!("Socket received close frame");
                    return SessionEnd::Dropped;
                }
                Some(Ok(_)) => {
                    // Ping/pong are answered by tungstenite; binary frames are not used.
                }
                Some(Err(e)) => {
                    crate::log_error!("Socket read error: {}", e);
                    return SessionEnd::Dropped;
                }
                None => return SessionEnd::Dropped,
            },
            outgoing = receiver.next() => match outgoing {
                Some(frame) => {
                    if let Err(e) = send_frame(&mut write, &frame).await {
                        crate::log_error!("Send failed: {}", e);
                        return SessionEnd::Dropped;
                    }
                }
                None => {
                    let _ = write.close().await;
                    return SessionEnd::Shutdown;
                }
            },
        }
    }
}

async fn send_frame<W>(write: &mut W, frame: &SocketFrame) -> Result<(), String>
where
    W: futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(frame).map_err(|e| e.to_string())?;
    write
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    fn idle() -> SocketConnection {
        SocketConnection::new(SocketConfig::new("ws://127.0.0.1:9"))
    }

    #[test]
    fn joining_twice_keeps_one_membership() {
        let conn = idle();
        assert_eq!(conn.join_room("attendance_updates"), Ok(true));
        assert_eq!(conn.join_room("attendance_updates"), Ok(false));
        assert_eq!(conn.joined_rooms().len(), 1);
    }

    #[test]
    fn leaving_unknown_room_is_noop() {
        let conn = idle();
        conn.join_room("timetable_updates").unwrap();
        assert!(!conn.leave_room("attendance_updates"));
        assert!(conn.leave_room("timetable_updates"));
        assert!(conn.joined_rooms().is_empty());
    }

    #[test]
    fn blank_room_is_rejected() {
        assert_eq!(idle().join_room("  "), Err(SocketError::InvalidRoom));
    }

    #[test]
    fn status_starts_disconnected() {
        let conn = idle();
        assert_eq!(conn.connection_status(), ConnectionStatus::Disconnected);
        assert!(!conn.is_connected());
        assert_eq!(conn.connection_status().as_str(), "disconnected");
    }

    #[test]
    fn backoff_is_capped() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(1500));
        assert_eq!(config.delay_for_attempt(40), Duration::from_millis(30000));
    }

    #[test]
    fn deliver_reaches_listeners() {
        let conn = idle();
        let (tx, rx) = std::sync::mpsc::channel();
        let _handle = conn.on("state-update", move |data: &Value| {
            let _ = tx.send(data.clone());
        });
        let frame = SocketFrame::new("state-update", json!({"type": "cart/cleared"}));
        assert_eq!(conn.deliver(&frame), 1);
        assert_eq!(rx.recv().unwrap()["type"], "cart/cleared");
    }

    #[tokio::test]
    async fn announces_rooms_and_delivers_events() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (first_tx, first_rx) = tokio::sync::oneshot::channel::<SocketFrame>();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            let msg = ws.next().await.unwrap().unwrap();
            let frame: SocketFrame = serde_json::from_str(msg.to_text().unwrap()).unwrap();
            first_tx.send(frame).unwrap();

            let event = json!({"event": "attendance_marked", "data": {"id": "a1"}}).to_string();
            ws.send(Message::Text(event.into())).await.unwrap();

            while let Some(Ok(_)) = ws.next().await {}
        });

        let conn = SocketConnection::new(SocketConfig::new(format!("ws://{addr}")));
        conn.join_room("attendance_updates").unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _handle = conn.on("attendance_marked", move |data: &Value| {
            let _ = tx.send(data.clone());
        });

        assert!(conn.start());
        assert!(!conn.start());

        let join = timeout(Duration::from_secs(5), first_rx).await.unwrap().unwrap();
        assert_eq!(join.event, "join_room");
        assert_eq!(join.room(), Some("attendance_updates"));

        let payload = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(payload["id"], "a1");
        assert!(conn.is_connected());

        conn.disconnect();
        assert_eq!(conn.connection_status(), ConnectionStatus::Disconnected);
    }
}
