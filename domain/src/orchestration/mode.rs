//! Execution mode of an orchestration run.
//!
//! The loop body is the same in both modes; the mode only tells it how
//! the result reaches the client.
//!
//! - **Inline**: the caller waits for the [`RunOutcome`](super::RunOutcome)
//!   and renders it; events are a side channel it may ignore.
//! - **Background**: the triggering request already returned, so events on
//!   the conversation channel are the only way the client learns anything.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Inline,
    Background,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Inline => "inline",
            RunMode::Background => "background",
        }
    }

    /// Whether progress events are the sole delivery path.
    pub fn events_only(&self) -> bool {
        matches!(self, RunMode::Background)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_inline() {
        assert_eq!(RunMode::default(), RunMode::Inline);
        assert!(!RunMode::Inline.events_only());
        assert!(RunMode::Background.events_only());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&RunMode::Background).unwrap();
        assert_eq!(json, "\"background\"");
    }
}
