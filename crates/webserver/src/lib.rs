//! Webhook Front End
//!
//! HTTP server that receives alerts for the Postee dispatch service. The
//! webhook handler set itself lives with the routing engine; this crate owns
//! the listener lifecycle and the liveness/health routes.

use async_trait::async_trait;
use axum::{routing::get, Router};
use lifecycle::{Service, ServiceLifecycle, ServiceState, WebService};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub mod routes;

/// Web server errors
#[derive(Debug, Error)]
pub enum WebServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Application state shared across handlers
pub struct AppState {
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    /// Lifecycle state of the owning server
    pub service_state: watch::Receiver<ServiceState>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ping", get(routes::health::ping))
        .route("/health", get(routes::health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The HTTP/TLS front end service
pub struct WebServer {
    lifecycle: ServiceLifecycle,
    local_addr: RwLock<Option<SocketAddr>>,
    tls_addr: RwLock<Option<SocketAddr>>,
}

impl WebServer {
    /// Create a web server in the uninitialized state
    pub fn new() -> Self {
        Self {
            lifecycle: ServiceLifecycle::new("webserver"),
            local_addr: RwLock::new(None),
            tls_addr: RwLock::new(None),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServiceState {
        self.lifecycle.state()
    }

    /// Address the plaintext listener is bound to, once bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.read().ok().and_then(|addr| *addr)
    }

    /// Requested TLS address, if it parsed
    pub fn tls_addr(&self) -> Option<SocketAddr> {
        self.tls_addr.read().ok().and_then(|addr| *addr)
    }

    /// Validate and record the TLS address.
    ///
    /// Certificate material is provisioned outside this service; without it
    /// the TLS endpoint stays closed.
    fn configure_tls(&self, tls: &str) {
        match tls.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Ok(mut slot) = self.tls_addr.write() {
                    *slot = Some(addr);
                }
                warn!(tls_addr = %addr, "no TLS certificate material supplied, TLS endpoint disabled");
            }
            Err(e) => warn!(tls = tls, error = %e, "invalid TLS address, TLS endpoint disabled"),
        }
    }

    async fn serve(&self, url: &str) -> Result<(), WebServerError> {
        let bind_err = |source| WebServerError::Bind {
            addr: url.to_string(),
            source,
        };
        let listener = TcpListener::bind(url).await.map_err(bind_err)?;
        let addr = listener.local_addr().map_err(bind_err)?;

        if let Ok(mut slot) = self.local_addr.write() {
            *slot = Some(addr);
        }

        let state = Arc::new(AppState {
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            service_state: self.lifecycle.subscribe(),
        });
        let app = create_router(state);

        info!("web server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(self.lifecycle.terminated())
            .await
            .map_err(WebServerError::Serve)
    }
}

impl Default for WebServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Service for WebServer {
    fn name(&self) -> &'static str {
        self.lifecycle.name()
    }

    async fn terminate(&self) {
        self.lifecycle.terminate().await;
    }

    fn request_terminate(&self) {
        self.lifecycle.request_terminate();
    }
}

#[async_trait]
impl WebService for WebServer {
    async fn start(&self, url: String, tls: String) {
        let Some(_running) = self.lifecycle.begin() else {
            return;
        };

        self.configure_tls(&tls);

        match self.serve(&url).await {
            Ok(()) => info!("web server stopped"),
            Err(e) => error!(error = %e, "web server failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let (_tx, rx) = watch::channel(ServiceState::Running);
        Arc::new(AppState {
            version: "test".to_string(),
            start_time: Instant::now(),
            service_state: rx,
        })
    }

    async fn wait_for_bind(server: &WebServer) -> SocketAddr {
        loop {
            if let Some(addr) = server.local_addr() {
                return addr;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_ping_route() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["version"], "test");
        assert!(json.get("uptime_seconds").is_some());
        assert!(json.get("tls_enabled").is_none());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_until_terminated() {
        let server = Arc::new(WebServer::new());
        let task_server = server.clone();
        let task = tokio::spawn(async move {
            task_server
                .start("127.0.0.1:0".to_string(), "127.0.0.1:8445".to_string())
                .await;
        });

        let addr = wait_for_bind(&server).await;
        assert_eq!(server.tls_addr(), Some("127.0.0.1:8445".parse().unwrap()));

        let body = reqwest::get(format!("http://{addr}/ping"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "Postee is alive!");

        server.terminate().await;
        task.await.unwrap();
        assert_eq!(server.state(), ServiceState::Terminated);
    }

    #[tokio::test]
    async fn test_bind_failure_finishes_service() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = occupied.local_addr().unwrap();

        let server = WebServer::new();
        // Returns once the bind fails instead of serving
        server.start(addr.to_string(), "not-an-address".to_string()).await;

        assert!(server.local_addr().is_none());
        assert!(server.tls_addr().is_none());

        // Nothing left running, so this does not block
        server.terminate().await;
        assert_eq!(server.state(), ServiceState::Terminated);
    }
}
