use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Delegation counters for dashboards and operators. Unrouted tasks are
/// counted here so policy friction is visible without reading logs.
#[derive(Debug, Default)]
pub struct OrchestratorMetrics {
    delegated: AtomicU64,
    unrouted: AtomicU64,
    errors: AtomicU64,
    drained: AtomicU64,
}

impl OrchestratorMetrics {
    /// Count a successfully dispatched task.
    pub fn record_delegated(&self) {
        self.delegated.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a task no worker matched.
    pub fn record_unrouted(&self) {
        self.unrouted.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an internal delegation failure.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a task popped from the backlog.
    pub fn record_drained(&self) {
        self.drained.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            delegated: self.delegated.load(Ordering::Relaxed),
            unrouted: self.unrouted.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
        }
    }
}

/// Serializable counter snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Tasks dispatched to a worker.
    pub delegated: u64,
    /// Tasks no worker matched.
    pub unrouted: u64,
    /// Internal delegation failures.
    pub errors: u64,
    /// Tasks popped from the backlog.
    pub drained: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = OrchestratorMetrics::default();
        metrics.record_delegated();
        metrics.record_delegated();
        metrics.record_unrouted();
        metrics.record_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.delegated, 2);
        assert_eq!(snapshot.unrouted, 1);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(snapshot.drained, 0);
    }
}
