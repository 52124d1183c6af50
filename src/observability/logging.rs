//! Structured logging.
//!
//! # Responsibilities
//! - Define the `Logger` contract used by every component
//! - Back it with the `tracing` crate
//! - Provide a no-op logger as a safe default
//! - Initialize the subscriber from configuration
//!
//! # Design Decisions
//! - Loggers are injected through constructors; there is no global default
//! - Persistent fields (component, trace_id) travel with the logger value
//! - `RUST_LOG` overrides the configured level

use std::fmt;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// One structured key/value argument.
pub type Field<'a> = (&'a str, &'a dyn fmt::Display);

/// Leveled, structured logger with persistent fields.
pub trait Logger: Send + Sync {
    fn debug(&self, msg: &str, fields: &[Field<'_>]);

    fn info(&self, msg: &str, fields: &[Field<'_>]);

    fn warn(&self, msg: &str, fields: &[Field<'_>]);

    fn error(&self, msg: &str, fields: &[Field<'_>]);

    /// New logger carrying one more persistent field.
    fn with_field(&self, key: &str, value: &dyn fmt::Display) -> Arc<dyn Logger>;
}

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl NoopLogger {
    pub fn shared() -> Arc<dyn Logger> {
        Arc::new(NoopLogger)
    }
}

impl Logger for NoopLogger {
    fn debug(&self, _msg: &str, _fields: &[Field<'_>]) {}

    fn info(&self, _msg: &str, _fields: &[Field<'_>]) {}

    fn warn(&self, _msg: &str, _fields: &[Field<'_>]) {}

    fn error(&self, _msg: &str, _fields: &[Field<'_>]) {}

    fn with_field(&self, _key: &str, _value: &dyn fmt::Display) -> Arc<dyn Logger> {
        Arc::new(NoopLogger)
    }
}

/// Field names recorded as individual structured fields. Must match the
/// field list of the span built in [`TracingLogger::fields_span`]. `name`
/// is left out because JSON output already uses it for the span name.
const STRUCTURED_FIELDS: &[&str] = &[
    "component",
    "service",
    "trace_id",
    "path",
    "original_path",
    "expanded_path",
    "env_var",
    "old_value",
    "new_value",
    "value",
    "route",
    "status",
    "latency_ms",
    "code",
    "error",
];

/// Logger that emits `tracing` events.
///
/// Persistent and per-call fields are recorded on a `log` span that wraps
/// each event, one `tracing` field per key. Keys outside
/// `STRUCTURED_FIELDS` are joined into the span's `extra` field.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    fields: Arc<Vec<(String, String)>>,
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger tagged with a `component` field.
    pub fn for_component(name: &str) -> Arc<dyn Logger> {
        TracingLogger::new().with_field("component", &name)
    }

    fn fields_span(&self, fields: &[Field<'_>]) -> tracing::Span {
        use tracing::field::{display, Empty};

        // Error level keeps the span enabled whenever any event is.
        let span = tracing::error_span!(
            "log",
            component = Empty,
            service = Empty,
            trace_id = Empty,
            path = Empty,
            original_path = Empty,
            expanded_path = Empty,
            env_var = Empty,
            old_value = Empty,
            new_value = Empty,
            value = Empty,
            route = Empty,
            status = Empty,
            latency_ms = Empty,
            code = Empty,
            error = Empty,
            extra = Empty,
        );

        let mut extra = Vec::new();
        let persistent = self.fields.iter().map(|(k, v)| (k.as_str(), v as &dyn fmt::Display));
        for (key, value) in persistent.chain(fields.iter().copied()) {
            if STRUCTURED_FIELDS.contains(&key) {
                span.record(key, display(value));
            } else {
                extra.push(format!("{key}={value}"));
            }
        }
        if !extra.is_empty() {
            span.record("extra", display(extra.join(" ")));
        }
        span
    }

    fn emit(&self, level: Level, msg: &str, fields: &[Field<'_>]) {
        self.fields_span(fields).in_scope(|| {
            if level == Level::ERROR {
                tracing::error!("{msg}");
            } else if level == Level::WARN {
                tracing::warn!("{msg}");
            } else if level == Level::INFO {
                tracing::info!("{msg}");
            } else {
                tracing::debug!("{msg}");
            }
        });
    }
}

impl Logger for TracingLogger {
    fn debug(&self, msg: &str, fields: &[Field<'_>]) {
        self.emit(Level::DEBUG, msg, fields);
    }

    fn info(&self, msg: &str, fields: &[Field<'_>]) {
        self.emit(Level::INFO, msg, fields);
    }

    fn warn(&self, msg: &str, fields: &[Field<'_>]) {
        self.emit(Level::WARN, msg, fields);
    }

    fn error(&self, msg: &str, fields: &[Field<'_>]) {
        self.emit(Level::ERROR, msg, fields);
    }

    fn with_field(&self, key: &str, value: &dyn fmt::Display) -> Arc<dyn Logger> {
        let mut fields = self.fields.as_ref().clone();
        fields.push((key.to_owned(), value.to_string()));
        Arc::new(Self {
            fields: Arc::new(fields),
        })
    }
}

/// Install the global `tracing` subscriber.
pub fn init_subscriber(
    config: &ObservabilityConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hello_tool_base={0},tower_http={0}", config.log_level)));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    }
}
