//! CourseHub Server
//!
//! Serves the front-end's own HTTP API (contact and waitlist forms, the image
//! proxy, build info) and optionally the front-end itself.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod config;
mod frontend;
mod mailer;
mod problem;
mod routes;
mod state;

#[cfg(test)]
mod test_support;

use config::ServerConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursehub_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let addr = config.bind_addr;
    tracing::info!(
        "CourseHub {} (build {}, {})",
        config.version.version,
        config.version.build_id,
        config.version.environment
    );

    let http = state::outbound_client(
        reqwest::Client::builder()
            .user_agent(concat!("coursehub-server/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(15)),
    )
    .context("failed to build HTTP client")?;

    let app = app::build_router(AppState::new(config, http));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
