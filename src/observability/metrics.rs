//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count requests, connections and failures
//! - Keep a per-identifier latency estimate
//! - Keep a bounded history of recent errors
//! - Produce self-consistent snapshots for `/admin/metrics`
//! - Mirror every update to the `metrics` facade for Prometheus scraping
//!
//! # Metrics
//! - `tool_requests_total` (counter): requests by identifier, outcome
//! - `tool_request_duration_seconds` (histogram): latency by identifier
//! - `tool_connections_total` (counter): unique connections seen
//! - `tool_connection_failures_total` (counter): accept failures
//! - `tool_errors_total` (counter): recorded errors by component
//! - `tool_active_connections` (gauge): currently open connections
//!
//! # Design Decisions
//! - One `RwLock` guards all counters, the latency map and the error buffer;
//!   writers take it exclusively, snapshots take it shared
//! - Runtime gauges are sampled while the snapshot is taken but are not
//!   synchronized with the runtime itself
//! - No operation can fail; a zero error buffer simply disables the history

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use parking_lot::RwLock;
use serde::{Serialize, Serializer};

use crate::buildinfo;

/// Install the Prometheus exporter and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

/// One entry in the recent-error history.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    #[serde(serialize_with = "unix_millis")]
    pub timestamp: SystemTime,
    pub component: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Point-in-time process and runtime gauges.
///
/// Fields are `None` when the value cannot be read on this platform or
/// outside a Tokio runtime.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeGauges {
    pub worker_threads: Option<usize>,
    pub alive_tasks: Option<usize>,
    pub process_threads: Option<u64>,
    pub resident_memory_bytes: Option<u64>,
    pub peak_resident_memory_bytes: Option<u64>,
}

impl RuntimeGauges {
    pub fn sample() -> Self {
        let mut gauges = Self::default();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let metrics = handle.metrics();
            gauges.worker_threads = Some(metrics.num_workers());
            gauges.alive_tasks = Some(metrics.num_alive_tasks());
        }
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            gauges.apply_proc_status(&status);
        }
        gauges
    }

    fn apply_proc_status(&mut self, status: &str) {
        for line in status.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key {
                "Threads" => self.process_threads = value.parse().ok(),
                "VmRSS" => self.resident_memory_bytes = parse_kib(value),
                "VmHWM" => self.peak_resident_memory_bytes = parse_kib(value),
                _ => {}
            }
        }
    }
}

fn parse_kib(value: &str) -> Option<u64> {
    let kib: u64 = value.strip_suffix("kB")?.trim().parse().ok()?;
    kib.checked_mul(1024)
}

/// Deep copy of the collector state at one instant.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerMetricsSnapshot {
    #[serde(serialize_with = "unix_millis")]
    pub start_time: SystemTime,
    pub uptime_secs: u64,
    pub version: &'static str,
    pub runtime: RuntimeGauges,
    pub active_connections: usize,
    pub total_connections: u64,
    pub failed_connections: u64,
    pub total_requests: u64,
    pub failed_requests: u64,
    /// Latency estimate in milliseconds per identifier.
    pub request_latencies: BTreeMap<String, u64>,
    /// Oldest first.
    pub last_errors: Vec<ErrorInfo>,
}

#[derive(Debug, Default)]
struct State {
    total_connections: u64,
    failed_connections: u64,
    total_requests: u64,
    failed_requests: u64,
    request_latencies: HashMap<String, u64>,
    active: HashSet<String>,
    errors: VecDeque<ErrorInfo>,
}

/// Thread-safe server metrics.
#[derive(Debug)]
pub struct MetricsCollector {
    start_time: SystemTime,
    started: Instant,
    error_capacity: usize,
    state: RwLock<State>,
}

impl MetricsCollector {
    /// Collector keeping at most `error_buffer_size` recent errors.
    pub fn new(error_buffer_size: usize) -> Self {
        Self {
            start_time: SystemTime::now(),
            started: Instant::now(),
            error_capacity: error_buffer_size,
            state: RwLock::new(State {
                errors: VecDeque::with_capacity(error_buffer_size),
                ..State::default()
            }),
        }
    }

    /// Record a completed request.
    ///
    /// The latency estimate for `identifier` is a two-point blend,
    /// `(old + latency_ms) / 2` with integer truncation, seeded by the first
    /// sample. It weights the newest sample as heavily as all prior history,
    /// so it follows recent values and is not an arithmetic mean.
    pub fn record_request(&self, identifier: &str, latency_ms: u64, success: bool) {
        {
            let mut state = self.state.write();
            state.total_requests += 1;
            if !success {
                state.failed_requests += 1;
            }
            state
                .request_latencies
                .entry(identifier.to_owned())
                .and_modify(|old| *old = blend(*old, latency_ms))
                .or_insert(latency_ms);
        }

        let outcome = if success { "success" } else { "failure" };
        metrics::counter!(
            "tool_requests_total",
            "identifier" => identifier.to_owned(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!(
            "tool_request_duration_seconds",
            "identifier" => identifier.to_owned()
        )
        .record(Duration::from_millis(latency_ms).as_secs_f64());
    }

    /// Track a connection opening (`active = true`) or closing.
    ///
    /// `total_connections` counts unique ids ever seen active and is never
    /// decremented.
    pub fn record_connection(&self, id: &str, active: bool) {
        let (newly_seen, open) = {
            let mut state = self.state.write();
            let newly_seen = if active {
                let inserted = state.active.insert(id.to_owned());
                if inserted {
                    state.total_connections += 1;
                }
                inserted
            } else {
                state.active.remove(id);
                false
            };
            (newly_seen, state.active.len())
        };

        if newly_seen {
            metrics::counter!("tool_connections_total").increment(1);
        }
        metrics::gauge!("tool_active_connections").set(open as f64);
    }

    /// Count a connection that failed before becoming active.
    pub fn record_connection_failure(&self) {
        self.state.write().failed_connections += 1;
        metrics::counter!("tool_connection_failures_total").increment(1);
    }

    /// Append to the recent-error history, evicting the oldest entry when
    /// full. No-op when the history is disabled.
    pub fn record_error(&self, component: &str, message: &str, stack: Option<&str>) {
        if self.error_capacity == 0 {
            return;
        }
        {
            let mut state = self.state.write();
            if state.errors.len() >= self.error_capacity {
                state.errors.pop_front();
            }
            state.errors.push_back(ErrorInfo {
                timestamp: SystemTime::now(),
                component: component.to_owned(),
                message: message.to_owned(),
                stack: stack.map(str::to_owned),
            });
        }
        metrics::counter!("tool_errors_total", "component" => component.to_owned()).increment(1);
    }

    /// Snapshot of all counters, latencies and recent errors.
    ///
    /// Runtime gauges are sampled before the lock is taken, so they are
    /// out-of-band with respect to the counters.
    pub fn get_current_metrics(&self) -> ServerMetricsSnapshot {
        self.snapshot_with(RuntimeGauges::sample())
    }

    fn snapshot_with(&self, runtime: RuntimeGauges) -> ServerMetricsSnapshot {
        let state = self.state.read();
        ServerMetricsSnapshot {
            start_time: self.start_time,
            uptime_secs: self.started.elapsed().as_secs(),
            version: buildinfo::VERSION,
            runtime,
            active_connections: state.active.len(),
            total_connections: state.total_connections,
            failed_connections: state.failed_connections,
            total_requests: state.total_requests,
            failed_requests: state.failed_requests,
            request_latencies: state
                .request_latencies
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            last_errors: state.errors.iter().cloned().collect(),
        }
    }

    /// Number of currently open connections.
    pub fn active_connections(&self) -> usize {
        self.state.read().active.len()
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

fn blend(old: u64, new: u64) -> u64 {
    ((u128::from(old) + u128::from(new)) / 2) as u64
}

fn unix_millis<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    let millis = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    serializer.serialize_u64(millis)
}
