use std::net::SocketAddr;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get_service,
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{auth, chat, contact, state::AppState};

/// Landing document served at `/`, relative to the static root.
pub const LANDING_PAGE: &str = "nice.html";

/// Any path segment starting with a dot, raw or percent-encoded, names a
/// hidden file (`.env`, `.git`) and is never served.
fn is_hidden(path: &str) -> bool {
    path.split('/').any(|seg| {
        let seg = seg.to_ascii_lowercase();
        seg.starts_with('.') || seg.starts_with("%2e")
    })
}

async fn hide_dotfiles(req: Request, next: Next) -> Response {
    if is_hidden(req.uri().path()) {
        tracing::warn!(path = %req.uri().path(), "refused hidden path");
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(req).await
}

pub fn build_app(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route(
            "/",
            get_service(ServeFile::new(static_dir.join(LANDING_PAGE))),
        )
        .merge(contact::router())
        .merge(auth::router())
        .merge(chat::router())
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
        .layer(middleware::from_fn(hide_dotfiles))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("Server running at http://localhost:{}", addr.port());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::state::fakes::StubCompletion;

    fn site() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LANDING_PAGE), "<h1>Afyadada</h1>").unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/site.css"), "body{}").unwrap();
        std::fs::write(dir.path().join(".env"), "JWT_SECRET=topsecret\nOPENAI_API_KEY=sk-live")
            .unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/config"), "[core]").unwrap();

        let state = AppState::fake_in(
            Arc::new(StubCompletion::replying("ok")),
            None,
            dir.path().to_path_buf(),
        );
        (dir, build_app(state))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let res = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn root_serves_landing_document() {
        let (_dir, app) = site();
        let (status, body) = get(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>Afyadada</h1>");
    }

    #[tokio::test]
    async fn other_paths_fall_through_to_static_files() {
        let (_dir, app) = site();
        let (status, body) = get(app.clone(), "/css/site.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body{}");

        let (status, _) = get(app, "/missing.png").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn dotfiles_in_static_root_are_not_served() {
        let (_dir, app) = site();
        for uri in ["/.env", "/.git/config", "/%2eenv", "/css/../.env"] {
            let (status, body) = get(app.clone(), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert!(!body.contains("topsecret"), "{uri}");
        }
    }

    #[test]
    fn hidden_paths_are_detected() {
        assert!(is_hidden("/.env"));
        assert!(is_hidden("/assets/.htaccess"));
        assert!(is_hidden("/%2Egit/config"));
        assert!(!is_hidden("/"));
        assert!(!is_hidden("/css/site.css"));
        assert!(!is_hidden("/nice.html"));
    }
}
