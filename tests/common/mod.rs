//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use hello_tool_base::config::AppConfig;
use hello_tool_base::lifecycle::Shutdown;
use hello_tool_base::net::Listener;
use hello_tool_base::observability::logging::NoopLogger;
use hello_tool_base::{HttpServer, MetricsCollector};

pub const ADMIN_KEY: &str = "test-admin-key";

/// Default config with short timeouts.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.name = "Test Tool".to_owned();
    config.server.bind_host = "127.0.0.1".to_owned();
    config.server.write_timeout = Duration::from_secs(5);
    config.server.graceful_timeout = Duration::from_secs(2);
    config.observability.error_buffer_size = 10;
    config
}

pub fn admin_config() -> AppConfig {
    let mut config = test_config();
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_owned();
    config
}

/// Router plus the collector it reports into.
pub fn test_router(config: AppConfig) -> (Router, Arc<MetricsCollector>) {
    let collector = Arc::new(MetricsCollector::new(config.observability.error_buffer_size));
    let server = HttpServer::new(config, Arc::clone(&collector), NoopLogger::shared());
    (server.router(), collector)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub collector: Arc<MetricsCollector>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server to finish draining.
    pub async fn stop(self) -> Arc<MetricsCollector> {
        self.shutdown.trigger();
        self.handle.await.unwrap();
        self.collector
    }
}

pub async fn start_server(config: AppConfig) -> TestServer {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let listener = Listener::from_tcp(tcp, config.server.max_connections);

    let collector = Arc::new(MetricsCollector::new(config.observability.error_buffer_size));
    let server = HttpServer::new(config, Arc::clone(&collector), NoopLogger::shared());
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));

    TestServer {
        addr,
        collector,
        shutdown,
        handle,
    }
}
