//! Router assembly.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::frontend::with_frontend_fallback;
use crate::routes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let frontend = state.config.frontend.clone();

    let api = Router::new()
        .route("/api/contact", post(routes::contact::submit_contact))
        .route("/api/waitlist", post(routes::waitlist::join_waitlist))
        .route("/api/images", get(routes::images::proxy_image))
        .route("/api/version", get(routes::version::get_version))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    with_frontend_fallback(api, &frontend)
}
