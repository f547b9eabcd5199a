//! RFC 7807 error responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use coursehub_shared::{FieldError, ProblemDetails};

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Handler error rendered as `application/problem+json`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiProblem(pub ProblemDetails);

pub type ApiResult<T> = Result<T, ApiProblem>;

impl ApiProblem {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self(ProblemDetails::bad_request(detail))
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self(ProblemDetails::validation(errors))
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self(ProblemDetails::forbidden(detail))
    }

    pub fn payload_too_large(detail: impl Into<String>) -> Self {
        Self(ProblemDetails::payload_too_large(detail))
    }

    pub fn unsupported_media_type(detail: impl Into<String>) -> Self {
        Self(ProblemDetails::unsupported_media_type(detail))
    }

    pub fn bad_gateway(detail: impl Into<String>) -> Self {
        Self(ProblemDetails::bad_gateway(detail))
    }

    pub fn service_unavailable(detail: impl Into<String>) -> Self {
        Self(ProblemDetails::service_unavailable(detail))
    }

    pub fn with_instance(self, instance: impl Into<String>) -> Self {
        Self(self.0.with_instance(instance))
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiProblem {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(self.0)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
        );
        response
    }
}
