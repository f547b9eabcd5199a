//! Build info route.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};

use crate::state::AppState;

/// Version endpoint (GET /api/version)
///
/// Never cached, so open clients can notice a redeploy.
pub async fn get_version(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store")],
        Json(state.config.version.clone()),
    )
}
