//! CourseHub client runtime.
//!
//! Everything between the socket and the cached domain state: the shared
//! socket connection, realtime subscriptions, the store and its reducer,
//! re-fetch thunks over the REST client, and the glue that wires server
//! events to store updates.

pub mod api_client;
pub mod bridge;
pub mod config;
pub mod errors;
pub mod logging;
pub mod storage;
pub mod stores;
pub mod thunks;
pub mod version;
pub mod ws;

#[cfg(test)]
mod test_support;

pub use api_client::ApiClient;
pub use bridge::RealtimeBridge;
pub use config::ClientConfig;
pub use errors::{AppHealth, ErrorMonitor};
pub use stores::{Action, AppState, Store};
pub use ws::{
    subscribe, ConnectionStatus, RealtimeOptions, RealtimeSubscription, RetryPolicy,
    SocketConfig, SocketConnection, SocketManager,
};
