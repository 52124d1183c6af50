//! hello-tool-base service binary.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │               HELLO TOOL BASE                │
//!                        │                                              │
//!   Client Request       │  ┌─────────┐   ┌──────────────────────────┐  │
//!   ─────────────────────┼─▶│   net   │──▶│ http (trace, correlation,│  │
//!                        │  │listener │   │ accounting, timeout)     │  │
//!                        │  └────┬────┘   └────────────┬─────────────┘  │
//!                        │       │                     ▼                │
//!                        │       │          ┌────────────────────┐      │
//!   Client Response      │       │          │ handlers / admin   │      │
//!   ◀────────────────────┼───────┼──────────│ DomainError → wire │      │
//!                        │       │          └────────────────────┘      │
//!                        │       ▼                     │                │
//!                        │  ┌──────────────────────────▼─────────────┐  │
//!                        │  │ observability: logging, metrics        │  │
//!                        │  └────────────────────────────────────────┘  │
//!                        │  ┌──────────┐  ┌───────────┐                 │
//!                        │  │  config  │  │ lifecycle │                 │
//!                        │  └──────────┘  └───────────┘                 │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use hello_tool_base::config::ConfigLoader;
use hello_tool_base::lifecycle::{signals, Shutdown};
use hello_tool_base::net::Listener;
use hello_tool_base::observability::logging::{init_subscriber, Logger, NoopLogger, TracingLogger};
use hello_tool_base::observability::metrics::{self, MetricsCollector};
use hello_tool_base::{buildinfo, HttpServer};

#[derive(Parser)]
#[command(name = "hello-tool-base", version, about = "Hello tool service")]
struct Args {
    /// Path to the TOML configuration file (a missing file means defaults).
    #[arg(
        short,
        long,
        default_value = "~/.config/hello-tool-base/config.toml",
        env = "HELLO_TOOL_CONFIG"
    )]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // The first pass only decides how to log; the second logs what it does.
    let bootstrap = ConfigLoader::from_process_env(NoopLogger::shared()).load_from_file(&args.config)?;
    init_subscriber(&bootstrap.observability)?;
    let config = ConfigLoader::from_process_env(TracingLogger::for_component("config"))
        .load_from_file(&args.config)?;

    let build = buildinfo::current();
    tracing::info!(name = %config.server.name, %build, "Starting");
    tracing::info!(
        bind_address = %config.server.bind_address(),
        max_connections = config.server.max_connections,
        write_timeout = %humantime::format_duration(config.server.write_timeout),
        admin_enabled = config.admin.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(error) = metrics::init_metrics(addr) {
                    tracing::error!(%error, "Failed to install Prometheus exporter");
                }
            }
            Err(error) => tracing::error!(
                %error,
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let collector = Arc::new(MetricsCollector::new(config.observability.error_buffer_size));
    let logger: Arc<dyn Logger> =
        TracingLogger::new().with_field("service", &config.server.name);

    let listener = Listener::bind(&config.server).await?;
    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config, collector, logger);
    server.run(listener, shutdown).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
