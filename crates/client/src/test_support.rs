//! A scripted HTTP server for exercising `ApiClient` in tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};

use crate::ApiClient;

/// An `ApiClient` that talks to `base_url` directly, ignoring proxy env vars.
pub fn local_api(base_url: &str) -> ApiClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    ApiClient::new().with_http_client(http).with_base_url(base_url)
}

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl CannedResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn problem(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/problem+json",
            body: body.to_string(),
        }
    }
}

impl IntoResponse for CannedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap();
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

/// A request as the server saw it. Header names are lowercase.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Default)]
struct Script {
    responses: Arc<Mutex<VecDeque<CannedResponse>>>,
    requests: Arc<Mutex<Vec<SeenRequest>>>,
}

pub struct ScriptedServer {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<SeenRequest>>>,
}

impl ScriptedServer {
    pub fn seen(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Answer requests with the canned responses in order, whatever the route.
/// Once the script runs out every request gets a 500.
pub async fn scripted_server(responses: Vec<CannedResponse>) -> ScriptedServer {
    let script = Script {
        responses: Arc::new(Mutex::new(responses.into())),
        ..Script::default()
    };
    let requests = script.requests.clone();
    let router = Router::new().fallback(answer).with_state(script);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    ScriptedServer {
        base_url: format!("http://{addr}"),
        requests,
    }
}

async fn answer(
    State(script): State<Script>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    script.requests.lock().unwrap().push(SeenRequest {
        method: method.to_string(),
        path: uri.path_and_query().map_or(uri.path(), |pq| pq.as_str()).to_string(),
        headers,
        body,
    });

    match script.responses.lock().unwrap().pop_front() {
        Some(response) => response.into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "script exhausted").into_response(),
    }
}
