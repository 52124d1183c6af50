//! Error responses.
//!
//! # Responsibilities
//! - Turn a `DomainError` into the mapped JSON body and an HTTP status
//! - Hand the full error to the request middleware for logging and metrics
//!
//! # Design Decisions
//! - Only `MappedError` is serialized; the domain error travels in the
//!   response extensions and never reaches the client
//! - Status codes are derived from the wire code, not the internal code

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::mapper::{
    AUTH_WIRE_CODE, PROTOCOL_INVALID_WIRE_CODE, PROTOCOL_UNSUPPORTED_WIRE_CODE,
    RESOURCE_FORBIDDEN_WIRE_CODE, RESOURCE_INVALID_WIRE_CODE, RESOURCE_NOT_FOUND_WIRE_CODE,
};
use crate::error::{DomainError, ErrorCode};

/// HTTP status for a wire code.
pub fn status_for_wire_code(code: i32) -> StatusCode {
    const PARSE: i32 = ErrorCode::PARSE_ERROR.as_i32();
    const INVALID_REQUEST: i32 = ErrorCode::INVALID_REQUEST.as_i32();
    const INVALID_PARAMS: i32 = ErrorCode::INVALID_PARAMS.as_i32();
    const METHOD_NOT_FOUND: i32 = ErrorCode::METHOD_NOT_FOUND.as_i32();
    const SERVICE_NOT_FOUND: i32 = ErrorCode::SERVICE_NOT_FOUND.as_i32();
    const REQUEST_SEQUENCE: i32 = ErrorCode::REQUEST_SEQUENCE.as_i32();

    match code {
        PARSE | INVALID_REQUEST | INVALID_PARAMS | RESOURCE_INVALID_WIRE_CODE
        | PROTOCOL_INVALID_WIRE_CODE => StatusCode::BAD_REQUEST,
        AUTH_WIRE_CODE => StatusCode::UNAUTHORIZED,
        RESOURCE_FORBIDDEN_WIRE_CODE => StatusCode::FORBIDDEN,
        METHOD_NOT_FOUND | RESOURCE_NOT_FOUND_WIRE_CODE | PROTOCOL_UNSUPPORTED_WIRE_CODE => {
            StatusCode::NOT_FOUND
        }
        SERVICE_NOT_FOUND => StatusCode::SERVICE_UNAVAILABLE,
        REQUEST_SEQUENCE => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error returned by handlers, tagged with the component that raised it.
#[derive(Debug)]
pub struct ApiError {
    component: &'static str,
    error: DomainError,
}

impl ApiError {
    pub fn new(component: &'static str, error: DomainError) -> Self {
        Self { component, error }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }

    pub fn error(&self) -> &DomainError {
        &self.error
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self::new("http", error)
    }
}

/// Response extension carrying the error behind a failed response.
#[derive(Debug, Clone)]
pub struct FailedRequest(Arc<ApiError>);

impl FailedRequest {
    pub fn component(&self) -> &'static str {
        self.0.component
    }

    pub fn error(&self) -> &DomainError {
        &self.0.error
    }

    /// Backtrace text if one was captured, else the origin location.
    pub fn stack(&self) -> String {
        use std::backtrace::BacktraceStatus;

        let error = self.error();
        if error.backtrace().status() == BacktraceStatus::Captured {
            error.backtrace().to_string()
        } else {
            error.location().to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mapped = self.error.to_wire();
        let status = status_for_wire_code(mapped.code);
        let mut response = (status, Json(mapped)).into_response();
        response
            .extensions_mut()
            .insert(FailedRequest(Arc::new(self)));
        response
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
