//! Administrative UI Server

use crate::config::UiConfig;
use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use lifecycle::{Service, ServiceLifecycle, ServiceState};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// UI server errors
#[derive(Debug, Error)]
pub enum UiServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// State shared across UI handlers
pub struct UiState {
    pub cfg_path: PathBuf,
    pub remote_restart: bool,
    pub version: String,
    pub service_state: watch::Receiver<ServiceState>,
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: ServiceState,
    pub version: String,
    pub remote_restart: bool,
}

/// Handler error rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Create the UI router; unknown paths are served from the web directory
pub fn create_router(state: Arc<UiState>, web_path: PathBuf) -> Router {
    Router::new()
        .route("/api/config", get(get_config))
        .route("/api/status", get(get_status))
        .fallback_service(ServeDir::new(web_path))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_config(State(state): State<Arc<UiState>>) -> Result<Json<Value>, ApiError> {
    let raw = tokio::fs::read_to_string(&state.cfg_path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ApiError::NotFound(format!("{} not found", state.cfg_path.display()))
            }
            _ => ApiError::Internal(e.to_string()),
        })?;

    let cfg = serde_json::from_str(&raw).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(cfg))
}

async fn get_status(State(state): State<Arc<UiState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: *state.service_state.borrow(),
        version: state.version.clone(),
        remote_restart: state.remote_restart,
    })
}

/// The single administrative server of a UI process
pub struct UiServer {
    config: UiConfig,
    lifecycle: ServiceLifecycle,
    local_addr: RwLock<Option<SocketAddr>>,
}

impl UiServer {
    pub fn new(config: UiConfig) -> Self {
        Self {
            config,
            lifecycle: ServiceLifecycle::new("uiserver"),
            local_addr: RwLock::new(None),
        }
    }

    /// Resolved configuration
    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServiceState {
        self.lifecycle.state()
    }

    /// Address the listener is bound to, once bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.read().ok().and_then(|addr| *addr)
    }

    /// Serve until `stop` is called. A second call returns immediately.
    pub async fn start(&self) -> Result<(), UiServerError> {
        let Some(_running) = self.lifecycle.begin() else {
            return Ok(());
        };

        let addr = self.config.bind();
        let bind_err = |source| UiServerError::Bind {
            addr: addr.clone(),
            source,
        };
        let listener = TcpListener::bind(&addr).await.map_err(bind_err)?;
        let local = listener.local_addr().map_err(bind_err)?;
        if let Ok(mut slot) = self.local_addr.write() {
            *slot = Some(local);
        }

        let state = Arc::new(UiState {
            cfg_path: self.config.cfg_path.clone(),
            remote_restart: self.config.remote_restart_enabled(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            service_state: self.lifecycle.subscribe(),
        });
        let app = create_router(state, self.config.web_path.clone());

        info!(
            web = %self.config.web_path.display(),
            cfg = %self.config.cfg_path.display(),
            "UI server listening on http://{}",
            local
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(self.lifecycle.terminated())
            .await
            .map_err(UiServerError::Serve)?;

        info!("UI server stopped");
        Ok(())
    }

    /// Stop serving and wait for `start` to return
    pub async fn stop(&self) {
        self.lifecycle.terminate().await;
    }
}

#[async_trait]
impl Service for UiServer {
    fn name(&self) -> &'static str {
        self.lifecycle.name()
    }

    async fn terminate(&self) {
        self.stop().await;
    }

    fn request_terminate(&self) {
        self.lifecycle.request_terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::fs;
    use tower::ServiceExt;

    fn router(cfg_path: PathBuf, web_path: PathBuf, remote_restart: bool) -> Router {
        let (_tx, rx) = watch::channel(ServiceState::Running);
        let state = Arc::new(UiState {
            cfg_path,
            remote_restart,
            version: "test".to_string(),
            service_state: rx,
        });
        create_router(state, web_path)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_config_route() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("cfg.json");
        fs::write(&cfg, r#"{"AquaServer":"https://aqua","outputs":[]}"#).unwrap();

        let (status, body) = get(router(cfg, dir.path().to_path_buf(), false), "/api/config").await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["AquaServer"], "https://aqua");
    }

    #[tokio::test]
    async fn test_config_route_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("missing.json");

        let (status, body) = get(router(cfg, dir.path().to_path_buf(), false), "/api/config").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("not found"));
    }

    #[tokio::test]
    async fn test_config_route_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("cfg.json");
        fs::write(&cfg, "outputs: []").unwrap();

        let (status, _) = get(router(cfg, dir.path().to_path_buf(), false), "/api/config").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_status_route_hides_key() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(
            router(dir.path().join("cfg.json"), dir.path().to_path_buf(), true),
            "/api/status",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["remote_restart"], true);
        assert!(json.get("key").is_none());
    }

    #[tokio::test]
    async fn test_static_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>Postee</h1>").unwrap();

        let (status, body) = get(
            router(dir.path().join("cfg.json"), dir.path().to_path_buf(), false),
            "/index.html",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>Postee</h1>");
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let dir = tempfile::tempdir().unwrap();
        let server = Arc::new(UiServer::new(UiConfig {
            cfg_path: dir.path().join("cfg.json"),
            web_path: dir.path().to_path_buf(),
            port: 0,
            update_url: None,
            update_key: None,
        }));

        let task_server = server.clone();
        let task = tokio::spawn(async move { task_server.start().await });

        while server.local_addr().is_none() {
            tokio::task::yield_now().await;
        }
        assert_eq!(server.state(), ServiceState::Running);

        server.stop().await;
        assert!(task.await.unwrap().is_ok());
        assert_eq!(server.state(), ServiceState::Terminated);

        // Stopped servers do not start again
        assert!(server.start().await.is_ok());
        assert_eq!(server.state(), ServiceState::Terminated);
    }
}
