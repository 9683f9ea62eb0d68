use std::fmt;
use std::str::FromStr;

use lumos_primitives::BlockNumber;

/// How a block's sampling outcomes are turned into a confidence percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScoringPolicy {
    /// `(1 - 2^-n) * 100` where `n` is the number of successfully verified cells.
    #[default]
    Exponential,
    /// `successes / attempts * 100`.
    Ratio,
}

impl ScoringPolicy {
    pub fn score(&self, successes: u64, attempts: u64) -> f64 {
        match self {
            Self::Exponential => exponential_confidence(successes),
            Self::Ratio => ratio_confidence(successes, attempts),
        }
    }
}

impl fmt::Display for ScoringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exponential => f.write_str("exponential"),
            Self::Ratio => f.write_str("ratio"),
        }
    }
}

impl FromStr for ScoringPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exponential" => Ok(Self::Exponential),
            "ratio" => Ok(Self::Ratio),
            other => Err(format!("unknown scoring policy: {other}")),
        }
    }
}

/// Confidence, in percent, after `successes` successfully verified cells.
pub fn exponential_confidence(successes: u64) -> f64 {
    // 2^-1075 is already below the smallest subnormal f64.
    let exp = successes.min(1075) as i32;
    (1.0 - 0.5f64.powi(exp)) * 100.0
}

/// Share of successfully verified cells, in percent. Zero when nothing was attempted.
pub fn ratio_confidence(successes: u64, attempts: u64) -> f64 {
    if attempts == 0 {
        return 0.0;
    }
    successes.min(attempts) as f64 / attempts as f64 * 100.0
}

/// Packs a block number and its confidence into a single integer.
///
/// The block number occupies the bits above the lowest 32 and the confidence, scaled by `10^7`
/// (so 100% becomes `10^9`), the lowest 32 bits.
pub fn serialise_confidence(block: BlockNumber, confidence: f64) -> u128 {
    let scaled = (confidence.clamp(0.0, 100.0) * 1e7).round() as u128;
    ((block as u128) << 32) | scaled
}
