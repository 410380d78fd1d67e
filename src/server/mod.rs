//! Static Asset Server
//!
//! Serves the built web client out of `dist_dir`:
//! - `GET /health` → `{"ok":true}`
//! - files by path, directories by their `index.html`
//! - anything else falls back to `index.html` (SPA routing)
//!
//! HTML is never cached; every other asset is treated as immutable.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path as UrlPath, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ServerConfig;

const HTML_CACHE: &str = "no-cache, no-store, must-revalidate";
const ASSET_CACHE: &str = "public, max-age=31536000, immutable";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const MISSING_DIST: &str = "Missing dist/. Run `npm run build` before starting server.";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server terminated: {0}")]
    Serve(#[source] std::io::Error),
}

impl ServerError {
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::Bind { .. } => "BIND_FAILED",
            ServerError::Serve(_) => "SERVE_FAILED",
        }
    }
}

struct ServerState {
    dist_dir: PathBuf,
}

/// Content type by extension
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("css") => "text/css; charset=utf-8",
        Some("html") => "text/html; charset=utf-8",
        Some("ico") => "image/x-icon",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") | Some("map") => "application/json; charset=utf-8",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml; charset=utf-8",
        Some("txt") => TEXT_PLAIN,
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Relative path under the dist root; `..` never climbs above it.
fn sanitize(requested: &str) -> PathBuf {
    let mut parts: Vec<&str> = Vec::new();
    for part in requested.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    parts.iter().collect()
}

pub fn router(dist_dir: impl Into<PathBuf>) -> Router {
    let state = Arc::new(ServerState {
        dist_dir: dist_dir.into(),
    });

    Router::new()
        .route("/health", get(health))
        .route("/", get(serve_root))
        .route("/{*path}", get(serve_path))
        .with_state(state)
}

/// Bind `host:port` and serve until the process exits
pub async fn serve(config: &ServerConfig) -> Result<(), ServerError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(addr = %addr, dist_dir = %config.dist_dir, "tempo-fees listening on http://{}", addr);
    axum::serve(listener, router(&config.dist_dir))
        .await
        .map_err(ServerError::Serve)
}

async fn health(State(state): State<Arc<ServerState>>) -> Response {
    if !dist_exists(&state).await {
        return missing_dist();
    }
    (
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        r#"{"ok":true}"#,
    )
        .into_response()
}

async fn serve_root(State(state): State<Arc<ServerState>>) -> Response {
    resolve(&state, "").await
}

async fn serve_path(
    State(state): State<Arc<ServerState>>,
    UrlPath(path): UrlPath<String>,
) -> Response {
    resolve(&state, &path).await
}

async fn resolve(state: &ServerState, requested: &str) -> Response {
    if !dist_exists(state).await {
        return missing_dist();
    }

    let candidate = state.dist_dir.join(sanitize(requested));
    if let Ok(meta) = tokio::fs::metadata(&candidate).await {
        if meta.is_file() {
            return send_file(&candidate).await;
        }
        if meta.is_dir() {
            let index = candidate.join("index.html");
            if is_file(&index).await {
                return send_file(&index).await;
            }
        }
    }

    send_file(&state.dist_dir.join("index.html")).await
}

async fn send_file(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let mime = content_type(path);
            let cache = if mime.starts_with("text/html") {
                HTML_CACHE
            } else {
                ASSET_CACHE
            };
            let mut response = bytes.into_response();
            let headers = response.headers_mut();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache));
            response
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            text(StatusCode::NOT_FOUND, "Not found")
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read asset");
            text(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

async fn dist_exists(state: &ServerState) -> bool {
    tokio::fs::metadata(&state.dist_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

fn missing_dist() -> Response {
    text(StatusCode::INTERNAL_SERVER_ERROR, MISSING_DIST)
}

fn text(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, TEXT_PLAIN)], body).into_response()
}
