//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy endpoint and health probe
//! - Wire up middleware (tracing, request ID)
//! - Build the shared upstream client and rewriter once
//! - Serve until the shutdown signal, then drain

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware::map_request,
    response::IntoResponse,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::validation::HEALTH_PATH;
use crate::config::{validate_config, ConfigError, ProxyConfig};
use crate::error::ProxyError;
use crate::http::client::UpstreamClient;
use crate::http::handler::{proxy_handler, AppState};
use crate::http::request::mark_generated_request_id;
use crate::lifecycle::shutdown;
use crate::rewrite::ContentRewriter;

/// HTTP server for the rewriting proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// The configuration is validated first; a mount path the router cannot
    /// register is reported here instead of panicking.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let state = AppState {
            client: UpstreamClient::new(&config.upstream)?,
            rewriter: Arc::new(ContentRewriter::new()?),
            mount: Arc::new(config.proxy.clone()),
            request_timeout: Some(config.timeouts.request_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route(&config.proxy.mount_path, any(proxy_handler))
            .route(HEALTH_PATH, get(health))
            .fallback(not_found)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(map_request(mark_generated_request_id))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown_rx` fires. In-flight requests are allowed to finish.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mount_path = %self.config.proxy.mount_path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::recv(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
