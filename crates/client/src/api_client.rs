//! HTTP API client for the coursehub backend.

use std::sync::{Arc, PoisonError, RwLock};

use coursehub_shared::ApiError;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// JSON-over-HTTP client with bearer-token auth.
///
/// Clones share the token, so a login through one clone authenticates all.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: String::new(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Use a preconfigured `reqwest::Client` (timeouts, proxy settings).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Set the base URL for API requests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_token(self, token: Option<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if self.base_url.is_empty() {
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            }
        } else {
            let base = self.base_url.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        }
    }

    fn authorize(&self, rb: RequestBuilder) -> RequestBuilder {
        let rb = rb.header("X-Request-Id", uuid::Uuid::new_v4().to_string());
        match self.token() {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    async fn send<TRes: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<TRes, ApiError> {
        let resp = self
            .authorize(rb)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let is_success = resp.status().is_success();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

        if !is_success {
            return Err(ApiError::Http { status, body: text });
        }

        if text.is_empty() {
            serde_json::from_str("null").map_err(|e| ApiError::Deserialize(e.to_string()))
        } else {
            serde_json::from_str(&text).map_err(|e| ApiError::Deserialize(e.to_string()))
        }
    }

    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        let url = self.url(path);
        self.send(self.client.get(&url)).await
    }

    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let url = self.url(path);
        let body_bytes =
            serde_json::to_vec(body).map_err(|e| ApiError::Deserialize(e.to_string()))?;
        let rb = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .body(body_bytes);
        self.send(rb).await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_api, scripted_server, CannedResponse};
    use coursehub_shared::{ProblemDetails, ScheduleEvent};
    use serde_json::{json, Value};

    #[test]
    fn url_joining() {
        let api = ApiClient::new().with_base_url("http://host/api/");
        assert_eq!(api.url("/classes"), "http://host/api/classes");
        assert_eq!(api.url("classes"), "http://host/api/classes");
        assert_eq!(api.url("https://other/x"), "https://other/x");
        assert_eq!(ApiClient::new().url("classes"), "/classes");
    }

    #[tokio::test]
    async fn get_sends_bearer_token() {
        let server = scripted_server(vec![CannedResponse::json(
            200,
            json!([{
                "id": "e1",
                "title": "Math",
                "startsAt": "2026-03-02T09:00:00Z",
                "endsAt": "2026-03-02T10:00:00Z"
            }]),
        )])
        .await;

        let api = local_api(&server.base_url).with_token(Some("secret".to_string()));
        let events: Vec<ScheduleEvent> = api.get_json("/schedule").await.unwrap();
        assert_eq!(events[0].title, "Math");

        let seen = server.seen();
        assert_eq!(seen[0].method, "GET");
        assert_eq!(seen[0].path, "/schedule");
        assert_eq!(seen[0].header("authorization"), Some("Bearer secret"));
        assert!(seen[0].header("x-request-id").is_some());
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let server = scripted_server(vec![CannedResponse::json(201, json!({"ok": true}))]).await;
        let api = local_api(&server.base_url);

        let reply: Value = api.post_json("/things", &json!({"a": 1})).await.unwrap();
        assert_eq!(reply, json!({"ok": true}));

        let seen = server.seen();
        assert_eq!(seen[0].method, "POST");
        assert_eq!(seen[0].header("authorization"), None);
        assert_eq!(serde_json::from_str::<Value>(&seen[0].body).unwrap(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn error_status_maps_to_http() {
        let problem = ProblemDetails::forbidden("Not your class");
        let server = scripted_server(vec![CannedResponse::problem(
            403,
            serde_json::to_value(&problem).unwrap(),
        )])
        .await;
        let api = local_api(&server.base_url);

        let err = api.get_json::<Value>("/classes").await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.user_message(), "Not your class");
    }

    #[tokio::test]
    async fn bad_body_maps_to_deserialize() {
        let server = scripted_server(vec![CannedResponse::json(200, json!({"not": "a list"}))]).await;
        let api = local_api(&server.base_url);

        let err = api.get_json::<Vec<ScheduleEvent>>("/schedule").await.unwrap_err();
        assert!(matches!(err, ApiError::Deserialize(_)));
    }

    #[tokio::test]
    async fn refused_connection_maps_to_network() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = local_api(&format!("http://{addr}"));
        let err = api.get_json::<Value>("/classes").await.unwrap_err();
        assert!(err.is_network());
    }
}
