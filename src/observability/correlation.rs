//! Request correlation.
//!
//! Every request carries a correlation id: the value of the inbound
//! `X-Cloud-Trace-Context` header when present, otherwise a freshly
//! generated `generated-<uuid>`. The id is echoed on the `X-Trace-ID`
//! response header and attached as `trace_id` to a request-scoped logger.
//!
//! Both values live in the request extensions under the [`CorrelationId`]
//! and [`RequestLogger`] types, so no other component can collide with them.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderName, HeaderValue, Request, Response};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

use crate::observability::logging::{Logger, NoopLogger};

/// Header carrying a caller-supplied correlation id.
pub const INBOUND_HEADER: HeaderName = HeaderName::from_static("x-cloud-trace-context");

/// Header always set on responses.
pub const OUTBOUND_HEADER: HeaderName = HeaderName::from_static("x-trace-id");

const GENERATED_PREFIX: &str = "generated-";

/// The correlation id of the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationId(String);

impl CorrelationId {
    fn generate() -> Self {
        Self(format!("{GENERATED_PREFIX}{}", Uuid::new_v4()))
    }

    fn from_headers(headers: &axum::http::HeaderMap) -> Option<Self> {
        let value = headers.get(INBOUND_HEADER)?.to_str().ok()?;
        if value.trim().is_empty() {
            return None;
        }
        Some(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id was minted here rather than supplied by the caller.
    pub fn is_generated(&self) -> bool {
        self.0.starts_with(GENERATED_PREFIX)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logger scoped to the current request, carrying `trace_id`.
#[derive(Clone)]
pub struct RequestLogger(Arc<dyn Logger>);

impl RequestLogger {
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.0
    }

    pub fn into_inner(self) -> Arc<dyn Logger> {
        self.0
    }
}

impl fmt::Debug for RequestLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestLogger")
    }
}

/// Request-scoped logger, or a no-op logger if the correlation layer did not
/// run for this request.
pub fn request_logger(extensions: &Extensions) -> Arc<dyn Logger> {
    match extensions.get::<RequestLogger>() {
        Some(logger) => Arc::clone(&logger.0),
        None => {
            tracing::warn!("request logger missing from extensions; is CorrelationLayer installed?");
            NoopLogger::shared()
        }
    }
}

/// Correlation id of the request, or an empty string if none was attached.
pub fn correlation_id(extensions: &Extensions) -> String {
    extensions
        .get::<CorrelationId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(correlation_id(&parts.extensions)))
    }
}

impl<S> FromRequestParts<S> for RequestLogger
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(request_logger(&parts.extensions)))
    }
}

/// Layer attaching correlation ids and request loggers.
#[derive(Clone)]
pub struct CorrelationLayer {
    base: Arc<dyn Logger>,
}

impl CorrelationLayer {
    pub fn new(base: Arc<dyn Logger>) -> Self {
        Self { base }
    }
}

impl<S> Layer<S> for CorrelationLayer {
    type Service = CorrelationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationService {
            inner,
            base: Arc::clone(&self.base),
        }
    }
}

/// Service produced by [`CorrelationLayer`].
#[derive(Clone)]
pub struct CorrelationService<S> {
    inner: S,
    base: Arc<dyn Logger>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorrelationService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    ResBody: 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let id = CorrelationId::from_headers(req.headers()).unwrap_or_else(CorrelationId::generate);
        let logger = self.base.with_field("trace_id", &id);

        let span = tracing::info_span!("request", trace_id = %id);
        let header = HeaderValue::from_str(id.as_str());

        req.extensions_mut().insert(RequestLogger(logger));
        req.extensions_mut().insert(id.clone());
        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let mut res = fut.await?;
                match header {
                    Ok(value) => {
                        res.headers_mut().insert(OUTBOUND_HEADER, value);
                    }
                    Err(error) => {
                        tracing::error!(%error, trace_id = %id, "failed to encode trace id header");
                    }
                }
                Ok(res)
            }
            .instrument(span),
        )
    }
}
