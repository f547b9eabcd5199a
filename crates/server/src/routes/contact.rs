//! Contact form route.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use coursehub_shared::{validate_contact, ContactRequest, SubmissionResponse};

use super::{deliver, json_body, present};
use crate::mailer::OutgoingEmail;
use crate::problem::{ApiProblem, ApiResult};
use crate::state::AppState;

const INSTANCE: &str = "/api/contact";

/// Contact form endpoint (POST /api/contact)
pub async fn submit_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> ApiResult<Json<SubmissionResponse>> {
    let form = json_body(payload, INSTANCE)?;

    let errors = validate_contact(&form);
    if !errors.is_empty() {
        tracing::debug!("Contact form rejected: {} invalid field(s)", errors.len());
        return Err(ApiProblem::validation(errors).with_instance(INSTANCE));
    }

    let email = OutgoingEmail {
        from: state.config.email_from.clone(),
        to: vec![state.config.contact_to_email.clone()],
        subject: format!(
            "Contact form: {}",
            present(&form.subject).unwrap_or("New message")
        ),
        text: render(&form),
        reply_to: Some(form.email.trim().to_string()),
    };

    let id = deliver(&state, email, INSTANCE).await?;
    tracing::info!("Contact message {} sent", id);
    Ok(Json(SubmissionResponse { success: true, id }))
}

fn render(form: &ContactRequest) -> String {
    let mut text = format!("Name: {}\nEmail: {}\n", form.name.trim(), form.email.trim());
    if let Some(phone) = present(&form.phone) {
        text.push_str(&format!("Phone: {}\n", phone));
    }
    if let Some(subject) = present(&form.subject) {
        text.push_str(&format!("Subject: {}\n", subject));
    }
    text.push('\n');
    text.push_str(form.message.trim());
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_router;
    use crate::config::ServerConfig;
    use crate::test_support::{local_http, serve, state_with_mailer, test_state, RecordingMailer};
    use coursehub_shared::ProblemDetails;
    use serde_json::json;
    use std::sync::Arc;

    fn valid_form() -> serde_json::Value {
        json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "subject": "Evening classes",
            "message": "Do you run the analysis course in the evenings?"
        })
    }

    #[tokio::test]
    async fn sends_email_and_returns_id() {
        let mailer = Arc::new(RecordingMailer::default());
        let base = serve(build_router(state_with_mailer(mailer.clone()))).await;

        let resp = local_http()
            .post(format!("{base}/api/contact"))
            .json(&valid_form())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: SubmissionResponse = resp.json().await.unwrap();
        assert!(body.success);
        assert_eq!(body.id, "msg_1");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Contact form: Evening classes");
        assert_eq!(sent[0].reply_to.as_deref(), Some("ada@example.com"));
        assert!(sent[0].text.contains("analysis course"));
    }

    #[tokio::test]
    async fn short_message_is_a_field_error() {
        let mailer = Arc::new(RecordingMailer::default());
        let base = serve(build_router(state_with_mailer(mailer.clone()))).await;

        let mut form = valid_form();
        form["message"] = json!("Too short");
        let resp = local_http()
            .post(format!("{base}/api/contact"))
            .json(&form)
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 400);
        assert_eq!(
            resp.headers()["content-type"],
            crate::problem::PROBLEM_CONTENT_TYPE
        );
        let problem: ProblemDetails = resp.json().await.unwrap();
        assert!(problem.field_error("message").is_some());
        assert_eq!(problem.errors.len(), 1);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let base = serve(build_router(state_with_mailer(Arc::default()))).await;
        let resp = local_http()
            .post(format!("{base}/api/contact"))
            .header("content-type", "application/json")
            .body("{oops")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn missing_mailer_is_unavailable() {
        let base = serve(build_router(test_state(ServerConfig::default()))).await;
        let resp = local_http()
            .post(format!("{base}/api/contact"))
            .json(&valid_form())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 503);
    }

    #[tokio::test]
    async fn mailer_failure_is_bad_gateway() {
        let mailer = Arc::new(RecordingMailer::failing());
        let base = serve(build_router(state_with_mailer(mailer))).await;
        let resp = local_http()
            .post(format!("{base}/api/contact"))
            .json(&valid_form())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 502);
    }
}
