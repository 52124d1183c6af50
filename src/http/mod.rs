//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! accepted TCP connection
//!     → server.rs (hyper auto builder, HTTP/1.1 + HTTP/2)
//!     → TraceLayer → CorrelationLayer → middleware.rs (accounting) → timeout
//!     → handlers.rs (public routes) or admin (status, metrics)
//!     → response.rs (DomainError → mapped JSON + status)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use response::{status_for_wire_code, ApiError, FailedRequest};
pub use server::{AppState, HttpServer};
