//! Connection identity and lifetime tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for logs and metrics
//! - Report connection open/close to the metrics collector

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics::MetricsCollector;

/// Relaxed ordering is enough: only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Marks a connection active for as long as the guard lives.
///
/// Creation records `(id, true)`; drop records `(id, false)`.
#[derive(Debug)]
pub struct ConnectionGuard {
    id: ConnectionId,
    key: String,
    collector: Arc<MetricsCollector>,
}

impl ConnectionGuard {
    pub fn open(collector: Arc<MetricsCollector>) -> Self {
        let id = ConnectionId::new();
        let key = id.to_string();
        collector.record_connection(&key, true);
        tracing::trace!(connection_id = %id, "Connection opened");
        Self { id, key, collector }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.collector.record_connection(&self.key, false);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}
