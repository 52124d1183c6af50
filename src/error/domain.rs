//! Typed domain errors with cause chains and split context bags.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;

use serde_json::Value;
use thiserror::Error;

use super::codes::{ErrorCategory, ErrorCode};

/// Boxed cause accepted by every constructor.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// Alias keeps thiserror from treating the field as a nightly-only backtrace provider.
type CapturedBacktrace = Backtrace;

/// Context keys that are allowed to cross into a client-facing response.
///
/// Anything not expressible as a `SafeField` goes into the internal bag and
/// stays in server logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SafeField {
    Uri,
    ToolName,
    Method,
    ServiceName,
    ParameterName,
    QueryPath,
    RequestedPath,
}

impl SafeField {
    pub const ALL: [Self; 7] = [
        Self::Uri,
        Self::ToolName,
        Self::Method,
        Self::ServiceName,
        Self::ParameterName,
        Self::QueryPath,
        Self::RequestedPath,
    ];

    /// Key used in the wire `data` object.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uri => "uri",
            Self::ToolName => "toolName",
            Self::Method => "method",
            Self::ServiceName => "serviceName",
            Self::ParameterName => "parameter_name",
            Self::QueryPath => "query_path",
            Self::RequestedPath => "requested_path",
        }
    }
}

impl fmt::Display for SafeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context attached to a [`DomainError`].
///
/// `internal` holds arbitrary diagnostics for server logs. `safe` holds only
/// allowlisted fields and is the sole source for client-visible context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    internal: BTreeMap<String, Value>,
    safe: BTreeMap<SafeField, Value>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ErrorContext::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder form of [`ErrorContext::insert_safe`].
    pub fn with_safe(mut self, field: SafeField, value: impl Into<Value>) -> Self {
        self.insert_safe(field, value);
        self
    }

    /// Add a server-only entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.internal.insert(key.into(), value.into());
    }

    /// Add a client-safe entry.
    pub fn insert_safe(&mut self, field: SafeField, value: impl Into<Value>) {
        self.safe.insert(field, value.into());
    }

    pub fn internal(&self) -> &BTreeMap<String, Value> {
        &self.internal
    }

    pub fn safe(&self) -> &BTreeMap<SafeField, Value> {
        &self.safe
    }

    pub fn is_empty(&self) -> bool {
        self.internal.is_empty() && self.safe.is_empty()
    }

    /// Copy every entry of `other` into `self`; later values win.
    pub fn merge(&mut self, other: &ErrorContext) {
        self.internal
            .extend(other.internal.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.safe
            .extend(other.safe.iter().map(|(k, v)| (*k, v.clone())));
    }
}

impl<K, V> FromIterator<(K, V)> for ErrorContext
where
    K: Into<String>,
    V: Into<Value>,
{
    /// Collects into the internal bag only.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Self::new();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context
    }
}

/// An internally classified error.
///
/// Created once at its origin through a category constructor. The code is
/// always valid for that category: out-of-range input is replaced by the
/// category default instead of failing.
#[derive(Debug, Error)]
#[error("DomainError (code {code}): {message}{}", render_cause(.cause))]
pub struct DomainError {
    code: ErrorCode,
    message: String,
    #[source]
    cause: Option<BoxError>,
    context: ErrorContext,
    location: &'static Location<'static>,
    backtrace: CapturedBacktrace,
}

impl DomainError {
    #[track_caller]
    fn build(
        code: ErrorCode,
        message: impl Into<String>,
        cause: Option<BoxError>,
        context: ErrorContext,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            cause,
            context,
            location: Location::caller(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Authentication failure (1000-1999, default 1000).
    #[track_caller]
    pub fn auth(
        code: ErrorCode,
        message: impl Into<String>,
        cause: Option<BoxError>,
        context: ErrorContext,
    ) -> Self {
        Self::build(ErrorCategory::Auth.coerce(code), message, cause, context)
    }

    /// Resource access failure (3000-3999, default 3000).
    #[track_caller]
    pub fn resource(
        code: ErrorCode,
        message: impl Into<String>,
        cause: Option<BoxError>,
        context: ErrorContext,
    ) -> Self {
        Self::build(ErrorCategory::Resource.coerce(code), message, cause, context)
    }

    /// Internal protocol / application violation (4000-4999, default 4000).
    #[track_caller]
    pub fn protocol(
        code: ErrorCode,
        message: impl Into<String>,
        cause: Option<BoxError>,
        context: ErrorContext,
    ) -> Self {
        Self::build(ErrorCategory::Protocol.coerce(code), message, cause, context)
    }

    #[track_caller]
    pub fn parse_error(
        message: impl Into<String>,
        cause: Option<BoxError>,
        context: ErrorContext,
    ) -> Self {
        Self::build(ErrorCode::PARSE_ERROR, message, cause, context)
    }

    #[track_caller]
    pub fn invalid_request(
        message: impl Into<String>,
        cause: Option<BoxError>,
        context: ErrorContext,
    ) -> Self {
        Self::build(ErrorCode::INVALID_REQUEST, message, cause, context)
    }

    #[track_caller]
    pub fn method_not_found(
        message: impl Into<String>,
        cause: Option<BoxError>,
        context: ErrorContext,
    ) -> Self {
        Self::build(ErrorCode::METHOD_NOT_FOUND, message, cause, context)
    }

    #[track_caller]
    pub fn invalid_params(
        message: impl Into<String>,
        cause: Option<BoxError>,
        context: ErrorContext,
    ) -> Self {
        Self::build(ErrorCode::INVALID_PARAMS, message, cause, context)
    }

    #[track_caller]
    pub fn internal(
        message: impl Into<String>,
        cause: Option<BoxError>,
        context: ErrorContext,
    ) -> Self {
        Self::build(ErrorCode::INTERNAL_ERROR, message, cause, context)
    }

    /// A required internal service or component lookup failed (-32002).
    #[track_caller]
    pub fn service_not_found(
        message: impl Into<String>,
        cause: Option<BoxError>,
        context: ErrorContext,
    ) -> Self {
        Self::build(ErrorCode::SERVICE_NOT_FOUND, message, cause, context)
    }

    /// Message arrived out of order for the current state (-32001).
    #[track_caller]
    pub fn request_sequence(
        message: impl Into<String>,
        cause: Option<BoxError>,
        context: ErrorContext,
    ) -> Self {
        Self::build(ErrorCode::REQUEST_SEQUENCE, message, cause, context)
    }

    /// Returns the error with one more server-only context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key, value);
        self
    }

    /// Returns the error with one more client-safe context entry.
    pub fn with_safe_context(mut self, field: SafeField, value: impl Into<Value>) -> Self {
        self.context.insert_safe(field, value);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Source location of the constructor call.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Iterate the cause chain, nearest cause first.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        std::iter::successors(self.source(), |&err| err.source())
    }

    /// Find the first `DomainError` in `err` or anywhere in its source chain.
    pub fn find<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a DomainError> {
        std::iter::successors(Some(err), |&err| err.source())
            .find_map(|err| err.downcast_ref::<DomainError>())
    }

    /// Full server-side rendering: origin, cause chain, both context bags
    /// and the backtrace when one was captured.
    pub fn detailed(&self) -> Detailed<'_> {
        Detailed(self)
    }
}

fn render_cause(cause: &Option<BoxError>) -> String {
    cause
        .as_ref()
        .map(|cause| format!(": {cause}"))
        .unwrap_or_default()
}

/// Display adapter returned by [`DomainError::detailed`].
pub struct Detailed<'a>(&'a DomainError);

impl fmt::Display for Detailed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let err = self.0;
        write!(f, "DomainError (code {}): {}", err.code, err.message)?;
        write!(f, "\n  origin: {}", err.location)?;
        for cause in err.chain() {
            write!(f, "\n  caused by: {cause}")?;
        }
        if !err.context.internal.is_empty() {
            write!(f, "\n  context:")?;
            for (key, value) in &err.context.internal {
                write!(f, " {key}={value}")?;
            }
        }
        if !err.context.safe.is_empty() {
            write!(f, "\n  safe context:")?;
            for (field, value) in &err.context.safe {
                write!(f, " {field}={value}")?;
            }
        }
        if err.backtrace.status() == BacktraceStatus::Captured {
            write!(f, "\n  backtrace:\n{}", err.backtrace)?;
        }
        Ok(())
    }
}
