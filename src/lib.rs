//! hello-tool-base: a small JSON-over-HTTP tool service and its
//! observability core (error taxonomy and mapping, request correlation,
//! metrics collection).

pub mod admin;
pub mod buildinfo;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::AppConfig;
pub use error::{map_error, DomainError, ErrorCode, MappedError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::metrics::MetricsCollector;
