use lumos_confidence::ScoringPolicy;
use lumos_sampling::SamplingPolicy;

/// Number of cells sampled per block.
pub const DEFAULT_SAMPLE_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    pub sample_count: usize,
    /// Also sample the transpose of every drawn cell.
    pub symmetric: bool,
    pub scoring: ScoringPolicy,
}

impl SamplingConfig {
    pub fn policy(&self) -> SamplingPolicy {
        SamplingPolicy::new(self.sample_count).symmetric(self.symmetric)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            symmetric: false,
            scoring: ScoringPolicy::default(),
        }
    }
}
