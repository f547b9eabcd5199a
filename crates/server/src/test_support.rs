//! Helpers for driving the router over a real socket.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use crate::config::ServerConfig;
use crate::mailer::{MailError, Mailer, OutgoingEmail};
use crate::state::{outbound_client, AppState};

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A client that never goes through a proxy from the environment.
pub fn local_http() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Records messages instead of sending them; optionally fails every send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<String, MailError> {
        if self.fail {
            return Err(MailError::Rejected {
                status: 500,
                body: "provider down".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email);
        Ok(format!("msg_{}", sent.len()))
    }
}

pub fn test_state(config: ServerConfig) -> AppState {
    let http = outbound_client(reqwest::Client::builder().no_proxy()).unwrap();
    AppState::new(config, http)
}

pub fn state_with_mailer(mailer: Arc<RecordingMailer>) -> AppState {
    AppState {
        mailer: Some(mailer as Arc<dyn Mailer>),
        ..test_state(ServerConfig::default())
    }
}
