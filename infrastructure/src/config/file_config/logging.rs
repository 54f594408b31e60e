//! Logging and session storage configuration from TOML
//! (`[logging]` and `[session]` sections)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ```toml
/// [logging]
/// dir = "~/.local/state/chatloop/logs"   # daily rolling tracing log
/// events_file = "events.jsonl"           # JSONL progress event log
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub dir: Option<PathBuf>,
    pub events_file: Option<PathBuf>,
}

/// ```toml
/// [session]
/// dir = "~/.local/share/chatloop/sessions"   # omit to keep histories in memory
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    pub dir: Option<PathBuf>,
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &std::path::Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
