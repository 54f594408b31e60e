//! Composite progress notifier: delegates to multiple notifiers.
//!
//! Used to fan out run events to several sinks at once, e.g. the terminal
//! reporter and the JSONL event log.

use super::progress::ProgressNotifier;
use chatloop_domain::ProgressEnvelope;

/// A progress notifier that delegates to multiple inner notifiers.
///
/// Uses borrowed references with a lifetime parameter so both owned and
/// borrowed notifiers can be composed without wrapper types.
///
/// ```text
/// OrchestrationLoop.run(input, &composite, cancel)
///                                  |
///            +---------------------+---------------------+
///            |                                           |
///    ProgressReporter                            JsonlEventLogger
///    → terminal spinner                          → events.jsonl
/// ```
pub struct CompositeProgressNotifier<'a> {
    delegates: Vec<&'a dyn ProgressNotifier>,
}

impl<'a> CompositeProgressNotifier<'a> {
    pub fn new(delegates: Vec<&'a dyn ProgressNotifier>) -> Self {
        Self { delegates }
    }

    pub fn push(&mut self, delegate: &'a dyn ProgressNotifier) {
        self.delegates.push(delegate);
    }
}

impl ProgressNotifier for CompositeProgressNotifier<'_> {
    fn emit(&self, envelope: &ProgressEnvelope) {
        for d in &self.delegates {
            d.emit(envelope);
        }
    }
}
