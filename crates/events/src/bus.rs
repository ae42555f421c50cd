//! Per-run progress topic using tokio broadcast channels

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::types::{ProgressEnvelope, ProgressEvent};

/// Capacity for the broadcast channel. Receivers further behind than this lag
/// and skip events rather than slowing the publisher down.
const CHANNEL_CAPACITY: usize = 1000;
const HISTORY_LIMIT: usize = 2000;

struct History {
    events: VecDeque<ProgressEnvelope>,
    next_sequence: u64,
}

/// Fan-out topic for a single run.
///
/// Publishing never waits on observers. Events are recorded in a bounded
/// history so late observers can replay what they missed.
pub struct ProgressChannel {
    run_id: Uuid,
    history: RwLock<History>,
    sender: broadcast::Sender<ProgressEnvelope>,
    finished: AtomicBool,
}

impl ProgressChannel {
    pub fn new(run_id: Uuid) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            run_id,
            history: RwLock::new(History {
                events: VecDeque::with_capacity(64),
                next_sequence: 0,
            }),
            sender,
            finished: AtomicBool::new(false),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Publish an event to all current observers.
    ///
    /// Returns the number of observers that received it. Sequence assignment,
    /// history append and broadcast happen under one lock so every observer
    /// sees events in emission order.
    pub fn publish_event(&self, event: ProgressEvent) -> usize {
        if event.is_terminal() {
            self.finished.store(true, Ordering::SeqCst);
        }

        let mut history = self.history.write().unwrap_or_else(|e| e.into_inner());
        let envelope = ProgressEnvelope::new(self.run_id, history.next_sequence, event);
        history.next_sequence += 1;

        if history.events.len() >= HISTORY_LIMIT {
            history.events.pop_front();
        }
        history.events.push_back(envelope.clone());

        self.sender.send(envelope).unwrap_or(0)
    }

    /// Publish a progress line attributed to `source`.
    pub fn publish(&self, source: &str, message: impl Into<String>) -> usize {
        self.publish_event(ProgressEvent::message(source, message))
    }

    pub fn publish_finished(&self, status: &str, error: Option<String>) -> usize {
        self.publish_event(ProgressEvent::Finished {
            status: status.to_string(),
            error,
        })
    }

    /// Subscribe to live events. Events published before subscribing are only
    /// available through [`Self::get_history`].
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEnvelope> {
        self.sender.subscribe()
    }

    pub fn get_history(&self) -> Vec<ProgressEnvelope> {
        self.history
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .events
            .iter()
            .cloned()
            .collect()
    }

    /// Replay the history, then follow live events without gaps or repeats.
    pub fn history_plus_stream(&self) -> impl Stream<Item = ProgressEnvelope> + Send + 'static {
        let (history, rx) = {
            let guard = self.history.read().unwrap_or_else(|e| e.into_inner());
            (guard.events.iter().cloned().collect::<Vec<_>>(), self.sender.subscribe())
        };

        let hist_stream = futures::stream::iter(history);
        let live_stream =
            BroadcastStream::new(rx).filter_map(|res| async move { res.ok() });

        hist_stream.chain(live_stream)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn history_len(&self) -> usize {
        self.history.read().unwrap_or_else(|e| e.into_inner()).events.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl std::fmt::Debug for ProgressChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressChannel")
            .field("run_id", &self.run_id)
            .field("subscriber_count", &self.subscriber_count())
            .field("history_len", &self.history_len())
            .field("finished", &self.is_finished())
            .finish()
    }
}
