//! Outbound email.
//!
//! Handlers talk to the [`Mailer`] trait; production uses [`ResendMailer`]
//! over the Resend HTTP API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(String),
    #[error("mail provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected mail provider response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message, returning the provider's message id.
    async fn send(&self, email: OutgoingEmail) -> Result<String, MailError>;
}

pub struct ResendMailer {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: String,
}

impl ResendMailer {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            endpoint: RESEND_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<String, MailError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ResendResponse =
            serde_json::from_str(&body).map_err(|e| MailError::InvalidResponse(e.to_string()))?;
        tracing::debug!("Resend accepted message {}", parsed.id);
        Ok(parsed.id)
    }
}
