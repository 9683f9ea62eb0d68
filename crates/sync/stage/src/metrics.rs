use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// Metrics of the per-block verification runs.
#[derive(Metrics, Clone)]
#[metrics(scope = "sync.stage")]
pub struct StageMetrics {
    /// Total number of blocks whose verification run completed
    blocks_verified_total: Counter,
    /// Total number of blocks whose verification run failed
    blocks_failed_total: Counter,
    /// Total number of cells whose proof was accepted
    cells_verified_total: Counter,
    /// Total number of cells whose proof was rejected
    cells_failed_total: Counter,
    /// Duration of a block verification run
    verification_duration_seconds: Histogram,
}

impl StageMetrics {
    pub(crate) fn record_verified(&self, successes: u64, failures: u64, seconds: f64) {
        self.blocks_verified_total.increment(1);
        self.cells_verified_total.increment(successes);
        self.cells_failed_total.increment(failures);
        self.verification_duration_seconds.record(seconds);
    }

    pub(crate) fn record_failed(&self, seconds: f64) {
        self.blocks_failed_total.increment(1);
        self.verification_duration_seconds.record(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_derived() {
        let metrics = StageMetrics::default();
        metrics.record_verified(3, 1, 0.1);
        assert_eq!(format!("{metrics:?}"), "StageMetrics");
    }
}
