//! Metrics of the sync coordinator.
//!
//! - Latest chain head observed
//! - Catch-up target and window durations
//! - Blocks verified or failed, by catch-up and by live processing
//!
//! Per-block verification metrics are collected by [`lumos_stage::StageMetrics`].

use lumos_primitives::BlockNumber;
use lumos_stage::BlockOutcome;
use metrics::{Counter, Gauge, Histogram};
use metrics_derive::Metrics;

use crate::WindowSummary;

#[derive(Metrics, Clone)]
#[metrics(scope = "sync.pipeline")]
pub struct PipelineMetrics {
    /// Highest block number observed through the head subscription
    latest_block: Gauge,
    /// Block the catch-up is verifying up to
    catch_up_target: Gauge,
    /// Total number of completed catch-up windows
    catch_up_windows_total: Counter,
    /// Duration of a catch-up window
    catch_up_window_duration_seconds: Histogram,
    /// Total number of blocks verified by the catch-up
    catch_up_blocks_verified_total: Counter,
    /// Total number of blocks that failed verification during the catch-up
    catch_up_blocks_failed_total: Counter,
    /// Total number of new heads verified
    live_blocks_verified_total: Counter,
    /// Total number of new heads that failed verification
    live_blocks_failed_total: Counter,
}

impl PipelineMetrics {
    pub fn set_latest_block(&self, block: BlockNumber) {
        self.latest_block.set(block as f64);
    }

    pub fn set_catch_up_target(&self, block: BlockNumber) {
        self.catch_up_target.set(block as f64);
    }

    pub fn record_window(&self, summary: &WindowSummary, duration_seconds: f64) {
        self.catch_up_windows_total.increment(1);
        self.catch_up_window_duration_seconds.record(duration_seconds);
        self.catch_up_blocks_verified_total.increment(summary.verified.len() as u64);
        self.catch_up_blocks_failed_total.increment(summary.failed.len() as u64);
    }

    pub fn record_live(&self, outcome: &BlockOutcome) {
        if outcome.is_verified() {
            self.live_blocks_verified_total.increment(1);
        } else {
            self.live_blocks_failed_total.increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_are_usable_without_a_recorder() {
        let metrics = PipelineMetrics::default();
        let summary = WindowSummary { range: 1..=3, verified: vec![2, 3], failed: vec![1] };

        metrics.set_latest_block(3);
        metrics.record_window(&summary, 0.5);

        assert_eq!(format!("{metrics:?}"), "PipelineMetrics");
    }
}
