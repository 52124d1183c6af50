//! Request accounting middleware.
//!
//! Runs inside the correlation layer so the request logger is available.
//! Each request is reported to the collector as `(identifier, latency_ms,
//! success)`, where the identifier is the matched route template (or
//! `unmatched` for the fallback) and success means a status below 400.
//! Failed responses carrying a [`FailedRequest`] are logged in full and
//! added to the error history.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::response::FailedRequest;
use crate::http::server::AppState;
use crate::observability::correlation::request_logger;

const UNMATCHED: &str = "unmatched";

pub async fn track_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let identifier = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED.to_owned());
    let logger = request_logger(request.extensions());
    let start = Instant::now();

    let response = next.run(request).await;

    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let status = response.status();

    if let Some(failed) = response.extensions().get::<FailedRequest>() {
        let error = failed.error();
        logger.error(
            "Request failed",
            &[
                ("component", &failed.component()),
                ("code", &error.code()),
                ("error", &error.detailed()),
            ],
        );
        state
            .collector
            .record_error(failed.component(), &error.to_string(), Some(&failed.stack()));
    }

    state
        .collector
        .record_request(&identifier, latency_ms, status.as_u16() < 400);
    logger.debug(
        "Request completed",
        &[
            ("route", &identifier),
            ("status", &status.as_u16()),
            ("latency_ms", &latency_ms),
        ],
    );
    response
}
