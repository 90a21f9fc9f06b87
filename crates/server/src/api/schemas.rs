use serde::Serialize;

use iyashi_gateway::MetricsSnapshot;

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process is serving.
    pub status: String,
    /// Current pipeline counters.
    pub metrics: MetricsResponse,
}

/// Response body for `GET /metrics`.
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub received: u64,
    pub forbidden: u64,
    pub forwarded: u64,
    pub upstream_errors: u64,
    pub locations_hidden: u64,
    pub locations_coarsened: u64,
    pub contacts_stripped: u64,
    pub filter_anomalies: u64,
    pub audit_dispatched: u64,
    pub audit_dropped: u64,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(snap: MetricsSnapshot) -> Self {
        Self {
            received: snap.received,
            forbidden: snap.forbidden,
            forwarded: snap.forwarded,
            upstream_errors: snap.upstream_errors,
            locations_hidden: snap.locations_hidden,
            locations_coarsened: snap.locations_coarsened,
            contacts_stripped: snap.contacts_stripped,
            filter_anomalies: snap.filter_anomalies,
            audit_dispatched: snap.audit_dispatched,
            audit_dropped: snap.audit_dropped,
        }
    }
}
