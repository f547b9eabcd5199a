//! Frontend serving - proxy and static file services.

use axum::Router;
use axum_reverse_proxy::ReverseProxy;
use std::path::PathBuf;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::FrontendMode;

/// Add the page-serving fallback for everything outside `/api`.
///
/// Takes a router that already has `.with_state()` applied.
pub fn with_frontend_fallback(router: Router, mode: &FrontendMode) -> Router {
    match mode {
        FrontendMode::Proxy { target } => {
            tracing::info!("Frontend mode: proxy to {}", target);
            // ReverseProxy at "/" picks up every path the API router leaves unmatched
            let proxy: Router = ReverseProxy::new("/", target).into();
            router.merge(proxy)
        }
        FrontendMode::Static { dir } => {
            tracing::info!("Frontend mode: static files from {}", dir);
            let path = PathBuf::from(dir);
            let serve_dir = ServeDir::new(&path).fallback(ServeFile::new(path.join("index.html")));
            router.fallback_service(serve_dir)
        }
        FrontendMode::Disabled => {
            tracing::info!("Frontend mode: disabled (API only)");
            router
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::build_router;
    use crate::config::{FrontendMode, ServerConfig};
    use crate::test_support::{local_http, serve, test_state};

    #[tokio::test]
    async fn static_mode_serves_spa_fallback() {
        let dir = std::env::temp_dir().join(format!("coursehub-static-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<h1>CourseHub</h1>").unwrap();
        std::fs::write(dir.join("app.js"), "console.log(1)").unwrap();

        let config = ServerConfig {
            frontend: FrontendMode::Static {
                dir: dir.to_string_lossy().to_string(),
            },
            ..ServerConfig::default()
        };
        let base = serve(build_router(test_state(config))).await;
        let http = local_http();

        let js = http.get(format!("{base}/app.js")).send().await.unwrap();
        assert_eq!(js.text().await.unwrap(), "console.log(1)");

        let page = http.get(format!("{base}/courses/42")).send().await.unwrap();
        assert_eq!(page.text().await.unwrap(), "<h1>CourseHub</h1>");

        let api = http.get(format!("{base}/api/version")).send().await.unwrap();
        assert_eq!(api.status(), 200);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn disabled_mode_is_api_only() {
        let base = serve(build_router(test_state(ServerConfig::default()))).await;
        let resp = local_http().get(format!("{base}/courses")).send().await.unwrap();
        assert_eq!(resp.status(), 404);
    }
}
