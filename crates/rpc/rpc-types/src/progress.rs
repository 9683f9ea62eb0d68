use lumos_primitives::BlockNumber;
use serde::{Deserialize, Serialize};

/// Response of `light_getProgress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub verified_count: u64,
    pub started_block: Option<BlockNumber>,
    pub latest_block: BlockNumber,
    /// Seconds since the client started.
    pub uptime: u64,
    /// Verified blocks per second of uptime.
    pub verification_rate: f64,
}
