//! Per-instrument event fan-out.
//!
//! The bus is owned by the instrument's executor thread, so publication
//! needs no locking and is naturally in sequence order. Each subscriber
//! gets its own unbounded channel: an [`EventStream`] is an infinite,
//! append-only sequence that starts at the moment of subscription — replay
//! of history is a persistence collaborator's job, not ours. Disconnected
//! subscribers are dropped on the next publish.

use crossbeam_channel::{Receiver, Sender, unbounded};
use spotmatch_types::MarketEvent;

/// Fan-out of one instrument's events to all its subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<MarketEvent>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new subscription, starting from the next published event.
    pub fn subscribe(&mut self) -> EventStream {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        EventStream { receiver }
    }

    /// Publish events in order to every live subscriber; dead ones are
    /// pruned.
    pub fn publish(&mut self, events: &[MarketEvent]) {
        self.subscribers
            .retain(|subscriber| events.iter().all(|e| subscriber.send(e.clone()).is_ok()));
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// A subscriber's end of the event stream: lazy, infinite, not restartable.
#[derive(Debug)]
pub struct EventStream {
    receiver: Receiver<MarketEvent>,
}

impl EventStream {
    /// Block until the next event, or `None` once the publisher is gone.
    pub fn recv(&self) -> Option<MarketEvent> {
        self.receiver.recv().ok()
    }

    /// Non-blocking poll.
    pub fn try_recv(&self) -> Option<MarketEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drain everything already delivered without blocking.
    pub fn drain(&self) -> Vec<MarketEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Iterator for EventStream {
    type Item = MarketEvent;

    fn next(&mut self) -> Option<MarketEvent> {
        self.recv()
    }
}
