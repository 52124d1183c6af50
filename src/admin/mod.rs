//! Admin endpoints.
//!
//! `/admin/status` and `/admin/metrics`, mounted only when `admin.enabled`
//! and guarded by `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::{get_metrics, get_status};
use crate::http::server::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/metrics", get(get_metrics))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
