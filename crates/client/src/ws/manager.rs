//! Owner of the client's current socket connection.

use std::sync::{Arc, PoisonError, RwLock};

use super::connection::{ConnectionStatus, SocketConnection};

/// Slot holding the live socket connection, if there is one.
///
/// Cloning shares the slot. The connection is installed on startup or login
/// and cleared on logout; consumers that arrive before it exists see `None`
/// from `current()`.
#[derive(Clone, Default)]
pub struct SocketManager {
    current: Arc<RwLock<Option<Arc<SocketConnection>>>>,
}

impl SocketManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `connection` in place, disconnecting any previous one.
    pub fn install(&self, connection: SocketConnection) -> Arc<SocketConnection> {
        let connection = Arc::new(connection);
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(connection.clone());

        if let Some(previous) = previous {
            crate::log_info!("SocketManager: replacing connection to {}", previous.url());
            previous.disconnect();
        }
        connection
    }

    /// Tear the connection down (logout).
    pub fn clear(&self) {
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(previous) = previous {
            crate::log_info!("SocketManager: clearing connection to {}", previous.url());
            previous.disconnect();
        }
    }

    /// The live connection handle, if one is installed.
    pub fn current(&self) -> Option<Arc<SocketConnection>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_connected(&self) -> bool {
        self.current().is_some_and(|c| c.is_connected())
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.current()
            .map(|c| c.connection_status())
            .unwrap_or(ConnectionStatus::Disconnected)
    }
}
