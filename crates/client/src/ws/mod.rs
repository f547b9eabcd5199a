//! Socket layer: the shared connection and the realtime subscriptions built
//! on top of it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                SocketManager                 │
//! │   (slot owning the current SocketConnection) │
//! └──────────────────────────────────────────────┘
//!                        │
//!                        ▼
//!              ┌──────────────────┐
//!              │ SocketConnection │  status, rooms, listeners
//!              └──────────────────┘
//!                        │  one listener per subscription
//!          ┌─────────────┼─────────────┐
//!          ▼             ▼             ▼
//!   ┌────────────┐ ┌────────────┐ ┌────────────┐
//!   │Subscription│ │Subscription│ │Subscription│
//!   └────────────┘ └────────────┘ └────────────┘
//!          │             │             │
//!          └──────┬──────┴──────┬──────┘
//!                 ▼             ▼
//!          dispatch action   re-fetch thunk
//!                 └──────┬──────┘
//!                        ▼
//!                      Store
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let manager = SocketManager::new();
//! let connection = manager.install(SocketConnection::new(SocketConfig::new(url)));
//! connection.start();
//!
//! let _sub = subscribe(
//!     &manager,
//!     RealtimeOptions::new("attendance_marked").room("attendance_updates"),
//!     |payload| println!("{payload}"),
//! );
//! ```

mod connection;
mod debounce;
mod listeners;
mod manager;
mod realtime;

pub use connection::{
    ConnectionStatus, ReconnectConfig, SocketConfig, SocketConnection, SocketError,
};
pub use debounce::Debouncer;
pub use listeners::{EventCallback, ListenerHandle, ListenerRegistry};
pub use manager::SocketManager;
pub use realtime::{subscribe, RealtimeOptions, RealtimeSubscription, RetryPolicy};
