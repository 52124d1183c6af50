//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! request
//!     → correlation.rs (trace id from header or generated, scoped logger)
//!     → handlers log through the scoped logger (logging.rs)
//!     → metrics.rs (request, connection and error accounting)
//!
//! Consumers:
//!     → stdout (tracing-subscriber, pretty or JSON)
//!     → /admin/metrics (snapshot JSON)
//!     → Prometheus scrape (optional exporter)
//! ```
//!
//! # Design Decisions
//! - Loggers are injected, never fetched from a global
//! - The correlation id flows through request extensions and log fields
//! - The metrics collector is the only shared mutable state

pub mod correlation;
pub mod logging;
pub mod metrics;
