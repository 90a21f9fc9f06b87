use std::sync::atomic::{AtomicU64, Ordering};

use crate::disclosure::FilterStats;

/// Atomic counters tracking gateway pipeline outcomes.
///
/// All counters use relaxed ordering for maximum throughput. For a
/// consistent point-in-time view, call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    /// Requests that entered the pipeline (post-authentication).
    pub received: AtomicU64,
    /// Requests rejected by the access policy table.
    pub forbidden: AtomicU64,
    /// Requests successfully relayed to the upstream API.
    pub forwarded: AtomicU64,
    /// Upstream network or payload failures.
    pub upstream_errors: AtomicU64,
    /// Locations replaced by the hidden placeholder.
    pub locations_hidden: AtomicU64,
    /// Locations truncated to their coarse form.
    pub locations_coarsened: AtomicU64,
    /// Contact fields stripped from responses.
    pub contacts_stripped: AtomicU64,
    /// Records the disclosure filter could not classify.
    pub filter_anomalies: AtomicU64,
    /// Audit entries handed to the background dispatcher.
    pub audit_dispatched: AtomicU64,
    /// Audit entries lost to sink errors.
    pub audit_dropped: AtomicU64,
}

/// A point-in-time copy of all counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
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

impl GatewayMetrics {
    /// Increment the received counter.
    pub fn increment_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the forbidden counter.
    pub fn increment_forbidden(&self) {
        self.forbidden.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the forwarded counter.
    pub fn increment_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the upstream errors counter.
    pub fn increment_upstream_errors(&self) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the audit dispatched counter.
    pub fn increment_audit_dispatched(&self) {
        self.audit_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the audit dropped counter.
    pub fn increment_audit_dropped(&self) {
        self.audit_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold one filter pass's statistics into the counters.
    pub fn record_filter(&self, stats: &FilterStats) {
        self.locations_hidden.fetch_add(stats.hidden, Ordering::Relaxed);
        self.locations_coarsened
            .fetch_add(stats.coarsened, Ordering::Relaxed);
        self.contacts_stripped
            .fetch_add(stats.contacts_stripped, Ordering::Relaxed);
        self.filter_anomalies
            .fetch_add(stats.unclassified, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            forbidden: self.forbidden.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            upstream_errors: self.upstream_errors.load(Ordering::Relaxed),
            locations_hidden: self.locations_hidden.load(Ordering::Relaxed),
            locations_coarsened: self.locations_coarsened.load(Ordering::Relaxed),
            contacts_stripped: self.contacts_stripped.load(Ordering::Relaxed),
            filter_anomalies: self.filter_anomalies.load(Ordering::Relaxed),
            audit_dispatched: self.audit_dispatched.load(Ordering::Relaxed),
            audit_dropped: self.audit_dropped.load(Ordering::Relaxed),
        }
    }
}
