//! API route handlers.

pub mod contact;
pub mod images;
pub mod version;
pub mod waitlist;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::mailer::OutgoingEmail;
use crate::problem::{ApiProblem, ApiResult};
use crate::state::AppState;

/// Unwrap a JSON body, turning extractor failures into a problem response.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>, instance: &str) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiProblem::bad_request(rejection.body_text()).with_instance(instance))
}

/// Hand a form notification to the configured mailer.
async fn deliver(state: &AppState, email: OutgoingEmail, instance: &str) -> ApiResult<String> {
    let Some(mailer) = &state.mailer else {
        return Err(
            ApiProblem::service_unavailable("Email delivery is not configured").with_instance(instance),
        );
    };

    mailer.send(email).await.map_err(|e| {
        tracing::error!("{}: email delivery failed: {}", instance, e);
        ApiProblem::bad_gateway("We couldn't send your message. Please try again later.")
            .with_instance(instance)
    })
}

/// Optional form values, trimmed, with blanks treated as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
