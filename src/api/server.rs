//! API Server - HTTP listener for the gallery and news API
//!
//! Binds the TCP listener, applies CORS and serves the router until a
//! shutdown signal arrives.

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

use super::routes::router;
use crate::app::AppState;

/// HTTP server for the API
pub struct ApiServer {
    /// Shared application state
    state: Arc<AppState>,
    /// Address to bind
    addr: SocketAddr,
    /// CORS policy
    cors: CorsLayer,
    /// Socket listener
    listener: Option<TcpListener>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: Arc<AppState>, addr: SocketAddr, cors: CorsLayer) -> Self {
        Self {
            state,
            addr,
            cors,
            listener: None,
        }
    }

    /// Bind the listener
    pub async fn start(&mut self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.addr))?;

        info!(addr = %self.addr, "API server listening");

        self.listener = Some(listener);
        Ok(())
    }

    /// Serve requests until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.listener.context("Server not started")?;
        let app = router(self.state, self.cors);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("API server error")?;

        info!("API server stopped");
        Ok(())
    }
}

/// Build the CORS layer for an origin setting (`*` allows any origin)
pub fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let allow_origin = if origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        let value = HeaderValue::from_str(origin.trim())
            .with_context(|| format!("Invalid CORS origin '{}'", origin))?;
        AllowOrigin::exact(value)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any))
}
