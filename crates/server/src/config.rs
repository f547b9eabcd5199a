//! Server configuration from environment variables.

use std::net::SocketAddr;

use coursehub_shared::VersionInfo;

/// Frontend serving mode configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendMode {
    /// Proxy page requests to the frontend dev server.
    Proxy { target: String },
    /// Serve the built frontend from a directory, with `index.html` as the
    /// fallback for client-side routes.
    Static { dir: String },
    /// No frontend serving - API only.
    Disabled,
}

impl FrontendMode {
    /// Environment variables:
    /// - `COURSEHUB_FRONTEND_MODE`: "proxy" | "static" | "disabled" (default: "disabled")
    /// - `COURSEHUB_PROXY_TARGET`: target URL for proxy mode (default: "http://localhost:3001")
    /// - `COURSEHUB_STATIC_DIR`: directory for static mode (default: "./public")
    pub fn from_env() -> Self {
        Self::parse(
            &env_or("COURSEHUB_FRONTEND_MODE", "disabled"),
            std::env::var("COURSEHUB_PROXY_TARGET").ok(),
            std::env::var("COURSEHUB_STATIC_DIR").ok(),
        )
    }

    fn parse(mode: &str, target: Option<String>, dir: Option<String>) -> Self {
        match mode.to_lowercase().as_str() {
            "proxy" => FrontendMode::Proxy {
                target: target.unwrap_or_else(|| "http://localhost:3001".to_string()),
            },
            "static" => FrontendMode::Static {
                dir: dir.unwrap_or_else(|| "./public".to_string()),
            },
            "disabled" => FrontendMode::Disabled,
            other => {
                tracing::warn!("Unknown COURSEHUB_FRONTEND_MODE {:?}, serving API only", other);
                FrontendMode::Disabled
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Resend API key. Without it the form endpoints answer 503.
    pub resend_api_key: Option<String>,
    /// Inbox that receives contact and waitlist submissions.
    pub contact_to_email: String,
    pub email_from: String,
    /// The only host (optionally `host:port`) the image proxy will fetch from.
    pub image_proxy_host: String,
    pub version: VersionInfo,
    pub frontend: FrontendMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            resend_api_key: None,
            contact_to_email: "hello@coursehub.dev".to_string(),
            email_from: "CourseHub <noreply@coursehub.dev>".to_string(),
            image_proxy_host: "localhost".to_string(),
            version: VersionInfo {
                version: env!("CARGO_PKG_VERSION").to_string(),
                build_id: "dev".to_string(),
                commit: None,
                built_at: None,
                environment: "development".to_string(),
            },
            frontend: FrontendMode::Disabled,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the environment, falling back to the defaults
    /// for anything unset.
    ///
    /// Fails only on a malformed `COURSEHUB_BIND_ADDR`.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = match std::env::var("COURSEHUB_BIND_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid COURSEHUB_BIND_ADDR {:?}: {}", raw, e))?,
            Err(_) => defaults.bind_addr,
        };

        let environment = std::env::var("COURSEHUB_ENV")
            .or_else(|_| std::env::var("NODE_ENV"))
            .unwrap_or(defaults.version.environment);

        let version = VersionInfo {
            version: env_or("APP_VERSION", &defaults.version.version),
            build_id: env_or("BUILD_ID", &defaults.version.build_id),
            commit: std::env::var("GIT_COMMIT_SHA").ok(),
            built_at: std::env::var("BUILD_TIME").ok(),
            environment,
        };

        Ok(Self {
            bind_addr,
            resend_api_key: std::env::var("RESEND_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            contact_to_email: env_or("CONTACT_TO_EMAIL", &defaults.contact_to_email),
            email_from: env_or("EMAIL_FROM", &defaults.email_from),
            image_proxy_host: env_or("IMAGE_PROXY_HOST", &defaults.image_proxy_host),
            version,
            frontend: FrontendMode::from_env(),
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontend_mode_parsing() {
        assert_eq!(
            FrontendMode::parse("PROXY", None, None),
            FrontendMode::Proxy {
                target: "http://localhost:3001".to_string()
            }
        );
        assert_eq!(
            FrontendMode::parse("static", None, Some("/srv/www".to_string())),
            FrontendMode::Static {
                dir: "/srv/www".to_string()
            }
        );
        assert_eq!(FrontendMode::parse("nonsense", None, None), FrontendMode::Disabled);
    }

    #[test]
    fn defaults_are_api_only() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert!(config.resend_api_key.is_none());
        assert_eq!(config.frontend, FrontendMode::Disabled);
    }
}
