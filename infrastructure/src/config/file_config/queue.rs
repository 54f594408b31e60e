//! Background queue configuration from TOML (`[queue]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw background queue configuration
///
/// ```toml
/// [queue]
/// tries = 3            # attempts per job
/// backoff_secs = 60    # pause between attempts
/// timeout_secs = 600   # per attempt
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileQueueConfig {
    pub tries: u32,
    pub backoff_secs: u64,
    pub timeout_secs: u64,
}

impl Default for FileQueueConfig {
    fn default() -> Self {
        Self {
            tries: 3,
            backoff_secs: 60,
            timeout_secs: 600,
        }
    }
}

impl FileQueueConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
