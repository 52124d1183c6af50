use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::buildinfo::{self, BuildInfo};
use crate::http::server::AppState;
use crate::observability::metrics::ServerMetricsSnapshot;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub name: String,
    pub status: &'static str,
    #[serde(flatten)]
    pub build: BuildInfo,
    pub uptime_secs: u64,
    pub active_connections: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        name: state.config.server.name.clone(),
        status: "operational",
        build: buildinfo::current(),
        uptime_secs: state.collector.uptime().as_secs(),
        active_connections: state.collector.active_connections(),
    })
}

pub async fn get_metrics(State(state): State<AppState>) -> Json<ServerMetricsSnapshot> {
    Json(state.collector.get_current_metrics())
}
