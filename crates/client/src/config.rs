//! Client configuration from environment variables.

use url::Url;

/// Settings the client runtime needs at startup.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Socket endpoint, as given (http(s) or ws(s)).
    pub socket_url: String,
    /// Base URL of the REST backend.
    pub api_url: String,
    /// Full URL of the frontend's build-info endpoint.
    pub version_url: String,
    /// Storage key for the persisted auth slice.
    pub auth_storage_key: String,
}

impl ClientConfig {
    /// Read configuration from the environment.
    ///
    /// Environment variables:
    /// - `COURSEHUB_SOCKET_URL` (falls back to `NEXT_PUBLIC_SOCKET_URL`,
    ///   default: "ws://localhost:5000")
    /// - `COURSEHUB_API_URL` (default: "http://localhost:5000/api")
    /// - `COURSEHUB_VERSION_URL` (default: "http://localhost:3000/api/version")
    pub fn from_env() -> Self {
        let socket_url = std::env::var("COURSEHUB_SOCKET_URL")
            .or_else(|_| std::env::var("NEXT_PUBLIC_SOCKET_URL"))
            .unwrap_or_else(|_| "ws://localhost:5000".to_string());
        let api_url = std::env::var("COURSEHUB_API_URL")
            .unwrap_or_else(|_| "http://localhost:5000/api".to_string());
        let version_url = std::env::var("COURSEHUB_VERSION_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api/version".to_string());

        Self {
            socket_url,
            api_url,
            version_url,
            auth_storage_key: "auth".to_string(),
        }
    }
}

/// Turn the configured socket endpoint into a `ws(s)://` URL, adding the auth
/// token as a query parameter when present.
pub fn socket_url_with_token(base: &str, token: Option<&str>) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;

    let scheme = match url.scheme() {
        "http" => Some("ws"),
        "https" => Some("wss"),
        _ => None,
    };
    if let Some(scheme) = scheme {
        // http -> ws and https -> wss are always accepted by `set_scheme`.
        let _ = url.set_scheme(scheme);
    }

    if let Some(token) = token {
        url.query_pairs_mut().append_pair("token", token);
    }

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_becomes_ws() {
        let url = socket_url_with_token("https://rt.example.com/socket", Some("a b")).unwrap();
        assert_eq!(url, "wss://rt.example.com/socket?token=a+b");
    }

    #[test]
    fn ws_url_is_kept() {
        let url = socket_url_with_token("ws://localhost:5000/", None).unwrap();
        assert_eq!(url, "ws://localhost:5000/");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(socket_url_with_token("not a url", None).is_err());
    }
}
