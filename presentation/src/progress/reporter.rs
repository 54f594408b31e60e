//! Progress reporting for orchestration runs

use crate::output::console::ConsoleFormatter;
use chatloop_application::ProgressNotifier;
use chatloop_domain::{ProgressEnvelope, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Reports run progress with a spinner; tool outcomes are printed above it
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn with_spinner(&self, f: impl FnOnce(&ProgressBar)) {
        let Ok(mut slot) = self.spinner.lock() else {
            return;
        };
        let spinner = slot.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        f(spinner);
    }

    fn finish(&self) {
        if let Ok(mut slot) = self.spinner.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn emit(&self, envelope: &ProgressEnvelope) {
        match &envelope.event {
            ProgressEvent::Queued { message, .. } => {
                let message = message.clone();
                self.with_spinner(|pb| pb.set_message(message));
            }
            ProgressEvent::ApiResponding { iteration, .. } => {
                let message = format!("Waiting for the model (iteration {})", iteration);
                self.with_spinner(|pb| pb.set_message(message));
            }
            ProgressEvent::ToolsExecuting { tool_calls, .. } => {
                let names: Vec<&str> = tool_calls.iter().map(|c| c.name.as_str()).collect();
                let message = format!("Running {}", names.join(", "));
                self.with_spinner(|pb| pb.set_message(message));
            }
            ProgressEvent::ToolsCompleted { .. } => {
                let line = ConsoleFormatter::event_line(envelope);
                self.with_spinner(|pb| pb.println(line));
            }
            ProgressEvent::Completed { .. } | ProgressEvent::Failed { .. } => self.finish(),
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn emit(&self, envelope: &ProgressEnvelope) {
        eprintln!("{}", ConsoleFormatter::event_line(envelope));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatloop_domain::RunMetrics;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_spinner_created_and_cleared() {
        let reporter = ProgressReporter::new();
        reporter.emit(&ProgressEnvelope::new(
            "ch",
            ProgressEvent::ApiResponding {
                iteration: 1,
                has_tool_calls: false,
            },
            Utc::now(),
        ));
        assert!(reporter.spinner.lock().unwrap().is_some());

        reporter.emit(&ProgressEnvelope::new(
            "ch",
            ProgressEvent::Completed {
                response: json!({}),
                metrics: RunMetrics {
                    iterations: 1,
                    duration_seconds: 0.1,
                    message_count: 3,
                },
            },
            Utc::now(),
        ));
        assert!(reporter.spinner.lock().unwrap().is_none());
    }
}
