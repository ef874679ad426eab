//! Configuration types.

use std::time::Duration;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// A suspended task waiting longer than this logs a warning (and keeps
    /// warning at this interval until its completion signal fires).
    /// A zero duration is floored to one millisecond.
    pub stall_warn_after: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            stall_warn_after: Duration::from_secs(300), // 5 minutes
        }
    }
}
