/// Number of blocks verified concurrently during catch-up.
pub const DEFAULT_BATCH_SIZE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub batch_size: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE }
    }
}
