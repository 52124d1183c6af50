//! HTTP server setup and connection handling.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, correlation, request accounting, timeout)
//! - Serve HTTP/1.1 and HTTP/2 on accepted connections
//! - Report connection lifetimes and accept failures to the collector
//! - Drain connections on shutdown, up to the graceful deadline

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::{middleware, Router};
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use tokio::time::Instant;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::config::AppConfig;
use crate::http::handlers;
use crate::http::middleware::track_request;
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionGuard, Listener, ListenerError};
use crate::observability::correlation::CorrelationLayer;
use crate::observability::logging::Logger;
use crate::observability::metrics::MetricsCollector;

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub collector: Arc<MetricsCollector>,
    pub logger: Arc<dyn Logger>,
}

/// HTTP server for the tool service.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: AppConfig, collector: Arc<MetricsCollector>, logger: Arc<dyn Logger>) -> Self {
        let state = AppState {
            config: Arc::new(config),
            collector,
            logger,
        };
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outer to inner: trace, correlation, request accounting,
    /// timeout.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(handlers::root))
            .route("/hello", get(handlers::hello))
            .route("/healthz", get(handlers::healthz));

        if state.config.admin.enabled {
            router = router.merge(admin::router(state.clone()));
        }

        router
            .fallback(handlers::not_found)
            .layer(TimeoutLayer::new(state.config.server.write_timeout))
            .layer(middleware::from_fn_with_state(state.clone(), track_request))
            .layer(CorrelationLayer::new(Arc::clone(&state.logger)))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Accept connections until `shutdown` fires, then drain.
    pub async fn run(self, listener: Listener, shutdown: Shutdown) {
        let server = &self.state.config.server;
        match listener.local_addr() {
            Ok(addr) => tracing::info!(address = %addr, name = %server.name, "HTTP server starting"),
            Err(error) => tracing::warn!(%error, "HTTP server starting on unknown address"),
        }

        let mut shutdown_rx = shutdown.subscribe();
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        let guard = ConnectionGuard::open(Arc::clone(&self.state.collector));
                        tracing::debug!(connection_id = %guard.id(), peer_addr = %peer, "Serving connection");

                        let service = TowerToHyperService::new(self.router.clone());
                        let read_timeout = server.read_timeout;
                        let mut conn_shutdown = shutdown_rx.clone();

                        tokio::spawn(async move {
                            let _permit = permit;
                            let _guard = guard;

                            let mut builder = auto::Builder::new(TokioExecutor::new());
                            builder
                                .http1()
                                .timer(TokioTimer::new())
                                .header_read_timeout(read_timeout);
                            let conn = builder.serve_connection(TokioIo::new(stream), service);
                            tokio::pin!(conn);

                            let result = tokio::select! {
                                result = conn.as_mut() => result,
                                _ = conn_shutdown.recv() => {
                                    conn.as_mut().graceful_shutdown();
                                    conn.await
                                }
                            };
                            if let Err(error) = result {
                                tracing::debug!(%error, peer_addr = %peer, "Connection ended with error");
                            }
                        });
                    }
                    Err(ListenerError::Closed) => break,
                    Err(error) => {
                        self.state.collector.record_connection_failure();
                        tracing::warn!(%error, "Accept failed");
                        // EMFILE and friends would otherwise spin the loop.
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        tracing::info!("Stopped accepting connections, draining");
        self.drain(server.graceful_timeout).await;
        tracing::info!("HTTP server stopped");
    }

    async fn drain(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = self.state.collector.active_connections();
            if remaining == 0 {
                return;
            }
            if Instant::now() >= deadline {
                tracing::warn!(remaining, "Graceful shutdown deadline reached with open connections");
                return;
            }
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    }
}
