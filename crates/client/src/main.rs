//! CourseHub client - headless realtime runtime.
//!
//! Restores the saved session, opens the socket, keeps the store in sync with
//! server events and watches for new deployments until Ctrl-C.

use anyhow::Context;
use coursehub_client::config::socket_url_with_token;
use coursehub_client::storage::FileStorage;
use coursehub_client::version::{UpdateDetector, UpdateStatus};
use coursehub_client::{
    thunks, ApiClient, AppHealth, AppState, ClientConfig, ErrorMonitor, RealtimeBridge,
    SocketConfig, SocketConnection, SocketManager, Store,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const VERSION_POLL_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("coursehub_client=debug")),
        )
        .init();

    let config = ClientConfig::from_env();

    let monitor = ErrorMonitor::new();
    monitor.install_panic_hook();

    let store = match FileStorage::default_location() {
        Some(storage) => {
            Store::with_persistence(AppState::default(), storage, config.auth_storage_key.clone())
        }
        None => {
            tracing::warn!("No config directory; session will not be persisted");
            Store::new(AppState::default())
        }
    };
    store.rehydrate();

    let token = store.state().auth.token;
    let api = ApiClient::new()
        .with_base_url(config.api_url.clone())
        .with_token(token.clone());

    let socket_url = socket_url_with_token(&config.socket_url, token.as_deref())
        .with_context(|| format!("invalid socket URL {:?}", config.socket_url))?;

    let manager = SocketManager::new();
    let connection = manager.install(SocketConnection::new(SocketConfig::new(socket_url)));
    connection.start();

    let bridge = RealtimeBridge::start(&manager, &store, &api);

    if store.state().auth.is_authenticated() {
        let (store, api) = (store.clone(), api.clone());
        tokio::spawn(async move {
            tokio::join!(
                thunks::fetch_classes(&store, &api),
                thunks::fetch_schedule(&store, &api),
                thunks::fetch_attendance(&store, &api),
                thunks::fetch_payments(&store, &api),
                thunks::fetch_tickets(&store, &api),
            );
        });
    } else {
        tracing::info!("No saved session; running with public data only");
    }

    let mut status_rx = connection.watch_status();
    tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            tracing::info!("Socket status: {}", status.as_str());
        }
    });

    let mut health_rx = monitor.subscribe();
    tokio::spawn(async move {
        while health_rx.changed().await.is_ok() {
            if let AppHealth::Failed { message } = &*health_rx.borrow_and_update() {
                tracing::error!("Client entered failed state: {}", message);
            }
        }
    });

    let detector = UpdateDetector::new(api.clone(), config.version_url.clone());
    tokio::spawn(async move {
        if let UpdateStatus::UpdateAvailable { latest, .. } =
            detector.poll(VERSION_POLL_INTERVAL).await
        {
            tracing::warn!("A new version ({}) is available; restart to update", latest);
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    tracing::info!("Shutting down");
    drop(bridge);
    manager.clear();
    Ok(())
}
