//! Application state shared across request handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::mailer::{Mailer, ResendMailer};

/// Finish building the outbound client. Redirects are never followed, so the
/// image proxy's host check covers every request it makes.
pub fn outbound_client(builder: reqwest::ClientBuilder) -> reqwest::Result<reqwest::Client> {
    builder.redirect(reqwest::redirect::Policy::none()).build()
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// `None` when no mail provider is configured.
    pub mailer: Option<Arc<dyn Mailer>>,
    /// Outbound client for the image proxy.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: ServerConfig, http: reqwest::Client) -> Self {
        let mailer = config.resend_api_key.as_ref().map(|key| {
            Arc::new(ResendMailer::new(http.clone(), key.clone())) as Arc<dyn Mailer>
        });
        if mailer.is_none() {
            tracing::warn!("RESEND_API_KEY not set; contact and waitlist forms are disabled");
        }

        Self {
            config: Arc::new(config),
            mailer,
            http,
        }
    }
}
