// Observation surface of the action log
//
// The log reports every transition to its subscribers synchronously, on the thread
// driving the edits. A lock-free channel is provided for consumers that prefer to
// drain events later (a UI refreshing its undo/redo menu once per frame).

use crate::undo::scenario::ScenarioAction;
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use serde::Serialize;

/// Direction the head of history moved in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MoveDirection {
    Undo,
    Redo,
}

/// Event emitted by the log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LogEvent {
    /// A transaction was opened; `depth` is 1 for a top-level transaction
    Begin { name: String, depth: usize },
    /// An action was recorded into the innermost open transaction
    Push {
        stack: String,
        action: String,
        merged: bool,
        scenario: Option<ScenarioAction>,
    },
    /// A transaction was committed
    Commit { name: String, toplevel: bool },
    /// A transaction was aborted; `undone` tells whether its actions were reverted
    Rollback { name: String, undone: bool },
    /// A committed transaction was undone or redone
    Move {
        direction: MoveDirection,
        name: String,
    },
}

/// Subscriber to log events
///
/// Observers must not call back into the log that notifies them.
pub trait LogObserver {
    fn on_event(&mut self, event: &LogEvent);
}

impl<F> LogObserver for F
where
    F: FnMut(&LogEvent),
{
    fn on_event(&mut self, event: &LogEvent) {
        self(event)
    }
}

pub type EventConsumer = HeapCons<LogEvent>;

/// Producer half of the event channel, registered as an observer
pub struct EventSender {
    producer: HeapProd<LogEvent>,
    dropped: usize,
}

impl EventSender {
    /// Events lost because the consumer did not keep up
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl LogObserver for EventSender {
    fn on_event(&mut self, event: &LogEvent) {
        if self.producer.try_push(event.clone()).is_err() {
            self.dropped += 1;
            log::warn!("Event channel full, dropping {:?}", event);
        }
    }
}

/// Create a bounded lock-free event channel
pub fn event_channel(capacity: usize) -> (EventSender, EventConsumer) {
    let rb = HeapRb::<LogEvent>::new(capacity.max(1));
    let (producer, consumer) = rb.split();
    (
        EventSender {
            producer,
            dropped: 0,
        },
        consumer,
    )
}
