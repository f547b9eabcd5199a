//! Course waitlist route.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use coursehub_shared::{validate_waitlist, SubmissionResponse, WaitlistRequest};

use super::{deliver, json_body, present};
use crate::mailer::OutgoingEmail;
use crate::problem::{ApiProblem, ApiResult};
use crate::state::AppState;

const INSTANCE: &str = "/api/waitlist";

/// Waitlist signup endpoint (POST /api/waitlist)
pub async fn join_waitlist(
    State(state): State<AppState>,
    payload: Result<Json<WaitlistRequest>, JsonRejection>,
) -> ApiResult<Json<SubmissionResponse>> {
    let form = json_body(payload, INSTANCE)?;

    let errors = validate_waitlist(&form);
    if !errors.is_empty() {
        return Err(ApiProblem::validation(errors).with_instance(INSTANCE));
    }

    let course = present(&form.course_name).unwrap_or(form.course_id.trim());
    let mut text = format!(
        "Name: {}\nEmail: {}\n",
        form.name.trim(),
        form.email.trim()
    );
    if let Some(phone) = present(&form.phone) {
        text.push_str(&format!("Phone: {}\n", phone));
    }
    text.push_str(&format!("Course: {} ({})\n", course, form.course_id.trim()));

    let email = OutgoingEmail {
        from: state.config.email_from.clone(),
        to: vec![state.config.contact_to_email.clone()],
        subject: format!("Waitlist signup: {}", course),
        text,
        reply_to: Some(form.email.trim().to_string()),
    };

    let id = deliver(&state, email, INSTANCE).await?;
    tracing::info!("Waitlist signup for course {} sent as {}", form.course_id.trim(), id);
    Ok(Json(SubmissionResponse { success: true, id }))
}
