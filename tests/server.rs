//! End-to-end tests over a real listener.

use std::time::Duration;

mod common;
use common::*;

#[tokio::test]
async fn serves_requests_and_drains_on_shutdown() {
    let server = start_server(test_config()).await;

    let client = reqwest::Client::new();
    let response = client
        .get(server.url("/hello?name=net"))
        .header("X-Cloud-Trace-Context", "trace-42")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-trace-id"], "trace-42");
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Hello, net!");

    let response = client.get(server.url("/missing")).send().await.unwrap();
    assert_eq!(response.status(), 404);
    drop(client);

    let collector = tokio::time::timeout(Duration::from_secs(10), server.stop())
        .await
        .unwrap();
    let snapshot = collector.get_current_metrics();
    assert_eq!(snapshot.total_requests, 2);
    assert_eq!(snapshot.failed_requests, 1);
    assert!(snapshot.total_connections >= 1);
    assert_eq!(snapshot.active_connections, 0);
}

#[tokio::test]
async fn each_connection_is_counted_once() {
    let server = start_server(test_config()).await;

    for _ in 0..3 {
        // A fresh client per request forces a fresh connection.
        let client = reqwest::Client::new();
        let response = client.get(server.url("/healthz")).send().await.unwrap();
        assert_eq!(response.status(), 200);
    }

    let collector = tokio::time::timeout(Duration::from_secs(10), server.stop())
        .await
        .unwrap();
    let snapshot = collector.get_current_metrics();
    assert_eq!(snapshot.total_connections, 3);
    assert_eq!(snapshot.total_requests, 3);
}

#[tokio::test]
async fn shutdown_triggered_before_run_stops_the_server() {
    use std::sync::Arc;

    use hello_tool_base::lifecycle::Shutdown;
    use hello_tool_base::net::Listener;
    use hello_tool_base::observability::logging::NoopLogger;
    use hello_tool_base::{HttpServer, MetricsCollector};

    let config = test_config();
    let tcp = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener = Listener::from_tcp(tcp, config.server.max_connections);
    let collector = Arc::new(MetricsCollector::new(10));
    let server = HttpServer::new(config, collector, NoopLogger::shared());

    let shutdown = Shutdown::new();
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(1), server.run(listener, shutdown))
        .await
        .expect("run returns when shutdown was already triggered");
}
