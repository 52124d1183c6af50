//! Request handlers for the public routes.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{Method, Uri};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::buildinfo;
use crate::error::{DomainError, ErrorCode, ErrorContext, SafeField};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::correlation::RequestLogger;

/// Plain-text banner.
pub async fn root(State(state): State<AppState>) -> String {
    format!("{} is running, {}\n", state.config.server.name, buildinfo::current())
}

#[derive(Debug, Deserialize)]
pub struct HelloParams {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Greeting {
    pub message: String,
}

/// `GET /hello?name=<name>`
pub async fn hello(
    logger: RequestLogger,
    method: Method,
    uri: Uri,
    params: Result<Query<HelloParams>, QueryRejection>,
) -> Result<Json<Greeting>, ApiError> {
    let context = ErrorContext::new()
        .with_safe(SafeField::ParameterName, "name")
        .with_safe(SafeField::QueryPath, uri.path())
        .with_safe(SafeField::Method, method.as_str());

    let Query(params) = params.map_err(|rejection| {
        ApiError::new(
            "hello",
            DomainError::invalid_params(
                "query string could not be decoded",
                Some(Box::new(rejection)),
                context.clone(),
            ),
        )
    })?;

    let name = match params.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => {
            return Err(ApiError::new(
                "hello",
                DomainError::invalid_params("missing required parameter 'name'", None, context),
            ))
        }
    };

    logger.logger().info("Greeting issued", &[("name", &name)]);
    Ok(Json(Greeting {
        message: format!("Hello, {name}!"),
    }))
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn healthz() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Fallback for unknown paths.
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::new(
        "router",
        DomainError::resource(
            ErrorCode::RESOURCE_NOT_FOUND,
            format!("no route for {method} {}", uri.path()),
            None,
            ErrorContext::new()
                .with_safe(SafeField::RequestedPath, uri.path())
                .with_safe(SafeField::Method, method.as_str()),
        ),
    )
}
