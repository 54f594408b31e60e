//! In-process broadcast of progress events.
//!
//! Each conversation channel (`private-jan-chat.{user}.{conversation}`) gets
//! its own [`tokio::sync::broadcast`] sender, created on first subscription.
//! Events on a channel nobody listens to are dropped, matching the
//! fire-and-forget contract of [`ProgressNotifier`].
//!
//! ```text
//! worker ──emit──▶ EventHub ──▶ channel A ──▶ subscriber(s)
//!                          └──▶ firehose  ──▶ subscribe_all()
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use chatloop_application::{ProgressNotifier, ProgressSubscriber};
use chatloop_domain::ProgressEnvelope;
use tokio::sync::broadcast;
use tracing::trace;

/// Events buffered per receiver before the slowest one starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

pub struct EventHub {
    channels: Mutex<HashMap<String, broadcast::Sender<ProgressEnvelope>>>,
    firehose: broadcast::Sender<ProgressEnvelope>,
    capacity: usize,
}

impl EventHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (firehose, _) = broadcast::channel(capacity);
        Self {
            channels: Mutex::new(HashMap::new()),
            firehose,
            capacity,
        }
    }

    /// Receive every event published on `channel` from now on.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<ProgressEnvelope> {
        let mut channels = match self.channels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Receive events from every channel.
    pub fn subscribe_all(&self) -> broadcast::Receiver<ProgressEnvelope> {
        self.firehose.subscribe()
    }

    /// Channels that currently have a sender registered.
    pub fn channel_count(&self) -> usize {
        self.channels.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for EventHub {
    fn emit(&self, envelope: &ProgressEnvelope) {
        let _ = self.firehose.send(envelope.clone());

        let Ok(mut channels) = self.channels.lock() else {
            return;
        };
        let Some(sender) = channels.get(&envelope.channel) else {
            trace!(channel = %envelope.channel, event = %envelope.kind(), "No subscribers, event dropped");
            return;
        };
        if sender.send(envelope.clone()).is_err() {
            // Every receiver is gone
            channels.remove(&envelope.channel);
        }
    }
}

impl ProgressSubscriber for EventHub {
    fn subscribe(&self, channel: &str) -> broadcast::Receiver<ProgressEnvelope> {
        EventHub::subscribe(self, channel)
    }
}
