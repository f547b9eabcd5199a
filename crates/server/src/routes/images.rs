//! Image proxy route.
//!
//! Fetches course and avatar images from the backend host so the browser
//! only ever talks to this origin. Responses are cached for a day and carry
//! a content hash ETag.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

use crate::problem::{ApiProblem, ApiResult};
use crate::state::AppState;

/// Maximum proxied image size (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const INSTANCE: &str = "/api/images";
const CACHE_CONTROL: &str = "public, max-age=86400";

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub url: Option<String>,
}

/// Image proxy endpoint (GET /api/images?url=...)
pub async fn proxy_image(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let raw = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiProblem::bad_request("Missing url parameter").with_instance(INSTANCE))?;

    let target = Url::parse(raw)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .ok_or_else(|| ApiProblem::bad_request("Invalid image URL").with_instance(INSTANCE))?;

    if !host_allowed(&target, &state.config.image_proxy_host) {
        tracing::warn!("Image proxy refused host {:?}", target.host_str());
        return Err(ApiProblem::forbidden("Image host is not allowed").with_instance(INSTANCE));
    }

    let mut upstream = state.http.get(target.as_str()).send().await.map_err(|e| {
        tracing::error!("Image fetch failed for {}: {}", target, e);
        ApiProblem::bad_gateway("Failed to fetch image").with_instance(INSTANCE)
    })?;

    if upstream.status().is_redirection() {
        tracing::warn!(
            "Image upstream redirected {} to {:?}",
            target,
            upstream.headers().get(header::LOCATION)
        );
        return Err(ApiProblem::bad_gateway("Image upstream redirected").with_instance(INSTANCE));
    }

    if !upstream.status().is_success() {
        return Err(ApiProblem::bad_gateway(format!(
            "Image upstream answered {}",
            upstream.status().as_u16()
        ))
        .with_instance(INSTANCE));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !content_type.to_ascii_lowercase().starts_with("image/") {
        return Err(ApiProblem::unsupported_media_type(format!(
            "Upstream content is not an image ({})",
            if content_type.is_empty() { "unknown" } else { content_type.as_str() }
        ))
        .with_instance(INSTANCE));
    }

    if upstream
        .content_length()
        .is_some_and(|len| len > MAX_IMAGE_BYTES as u64)
    {
        return Err(too_large());
    }

    // Content-Length can be absent or wrong, so the limit is enforced while reading.
    let mut bytes = Vec::new();
    while let Some(chunk) = upstream.chunk().await.map_err(|e| {
        tracing::error!("Image body read failed for {}: {}", target, e);
        ApiProblem::bad_gateway("Failed to read image").with_instance(INSTANCE)
    })? {
        if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }

    let etag = format!("\"{}\"", hex::encode(Sha256::digest(&bytes)));
    let cache_headers = [
        (header::ETAG, etag.clone()),
        (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
    ];

    if headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|tags| tags.split(',').any(|t| t.trim() == etag))
    {
        return Ok((StatusCode::NOT_MODIFIED, cache_headers).into_response());
    }

    let content_type = HeaderValue::from_str(&content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let mut response = (cache_headers, Body::from(bytes)).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    Ok(response)
}

fn too_large() -> ApiProblem {
    ApiProblem::payload_too_large(format!("Image exceeds {} bytes", MAX_IMAGE_BYTES))
        .with_instance(INSTANCE)
}

/// `allowed` is a bare host or `host:port`.
fn host_allowed(url: &Url, allowed: &str) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if allowed.eq_ignore_ascii_case(host) {
        return true;
    }
    match url.port_or_known_default() {
        Some(port) => allowed.eq_ignore_ascii_case(&format!("{host}:{port}")),
        None => false,
    }
}
