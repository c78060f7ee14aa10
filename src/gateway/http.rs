//! HTTP surface of the gateway.
//!
//! One route, `GET <route>` (default `/data`), answering with the table's
//! rows as a JSON array. Any origin may call it.

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::QueryGateway;
use crate::models::Record;
use axum::extract::State;
use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Build the gateway router with the given gateway injected as state.
pub fn router(gateway: Arc<QueryGateway>, route: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route(route, get(get_all_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

async fn get_all_handler(
    State(gateway): State<Arc<QueryGateway>>,
) -> Result<Json<Vec<Record>>, GatewayError> {
    match gateway.get_all().await {
        Ok(records) => Ok(Json(records)),
        Err(e) => {
            error!(
                table = %gateway.table(),
                error = %e,
                "Failed to read table"
            );
            Err(e)
        }
    }
}

/// Serves the gateway router until SIGINT/SIGTERM.
pub struct HttpServer {
    gateway: Arc<QueryGateway>,
    /// Host to bind to
    host: String,
    /// Port to bind to
    port: u16,
    /// Data route path
    route: String,
}

impl HttpServer {
    pub fn new(
        gateway: Arc<QueryGateway>,
        host: impl Into<String>,
        port: u16,
        route: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            host: host.into(),
            port,
            route: route.into(),
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Bind the listener and serve until a shutdown signal, then close the
    /// store connection.
    pub async fn run(&self) -> GatewayResult<()> {
        let bind_addr = self.bind_addr();

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            GatewayError::internal(format!("Failed to bind to {}: {}", bind_addr, e))
        })?;

        info!(address = %bind_addr, route = %self.route, "Gateway listening");

        let app = router(self.gateway.clone(), &self.route);

        // Requests in flight get this long after the first signal
        const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();

        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        self.gateway.close().await;
                        return Err(GatewayError::internal(format!(
                            "HTTP server error: {}",
                            e
                        )));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for requests to finish (send signal again to force exit)..."
                );

                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        self.gateway.close().await;

        Ok(())
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
