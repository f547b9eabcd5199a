//! Shared error types including RFC7807 Problem Details.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const PROBLEM_BASE: &str = "https://coursehub.dev/problems";

/// A single failing form field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// RFC7807 Problem Details (application/problem+json)
///
/// We use this as our canonical error envelope for `/api/*` endpoints so clients
/// can surface meaningful validation errors inline instead of failing to decode
/// a success response type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// A URI reference that identifies the specific occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Field-level validation failures, one entry per failing field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ProblemDetails {
    fn new(slug: &str, title: &str, status: u16, detail: impl Into<String>) -> Self {
        Self {
            type_url: format!("{PROBLEM_BASE}/{slug}"),
            title: title.to_string(),
            status,
            detail: Some(detail.into()),
            instance: None,
            errors: Vec::new(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new("bad-request", "Bad Request", 400, detail)
    }

    /// A 400 carrying the individual field failures.
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            errors,
            ..Self::new("validation", "Validation Failed", 400, "One or more fields are invalid")
        }
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new("forbidden", "Forbidden", 403, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new("not-found", "Not Found", 404, detail)
    }

    pub fn payload_too_large(detail: impl Into<String>) -> Self {
        Self::new("payload-too-large", "Payload Too Large", 413, detail)
    }

    pub fn unsupported_media_type(detail: impl Into<String>) -> Self {
        Self::new("unsupported-media-type", "Unsupported Media Type", 415, detail)
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new("internal-error", "Internal Server Error", 500, detail)
    }

    pub fn bad_gateway(detail: impl Into<String>) -> Self {
        Self::new("bad-gateway", "Bad Gateway", 502, detail)
    }

    pub fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new("service-unavailable", "Service Unavailable", 503, detail)
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// The first error reported for `field`, if any.
    pub fn field_error(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

/// Attempt to parse an RFC7807 (or RFC7807-ish) JSON body into a user-facing message.
/// Prefers `detail`, falls back to `title`.
pub fn try_problem_detail(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ProblemDetails>(body).ok()?;
    if let Some(detail) = parsed.detail {
        if !detail.trim().is_empty() {
            return Some(detail);
        }
    }
    if !parsed.title.trim().is_empty() {
        return Some(parsed.title);
    }
    None
}

/// API error type for client-side use.
///
/// Separates transport failures (`Network`) from the server answering with an
/// error status (`Http`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

impl ApiError {
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Authentication failures send the user back to the login page.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Message suitable for a toast or inline alert.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Http { status, body } => try_problem_detail(body)
                .unwrap_or_else(|| format!("Request failed with status {status}")),
            ApiError::Deserialize(_) => "The server returned an unexpected response.".to_string(),
        }
    }

    /// Field errors carried by a validation problem response.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            ApiError::Http { body, .. } => serde_json::from_str::<ProblemDetails>(body)
                .map(|p| p.errors)
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}
