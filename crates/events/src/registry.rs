use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};

use futures::stream::{BoxStream, Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;
use uuid::Uuid;

use crate::bus::ProgressChannel;
use crate::types::ProgressEnvelope;

/// Progress channels keyed by run id.
///
/// A channel is created when a run starts and torn down once the run has
/// finished and its last observer has gone away.
#[derive(Clone, Default)]
pub struct RunRegistry {
    channels: Arc<RwLock<HashMap<Uuid, Arc<ProgressChannel>>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, run_id: Uuid) -> Arc<ProgressChannel> {
        {
            let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
            if let Some(channel) = channels.get(&run_id) {
                return Arc::clone(channel);
            }
        }

        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            channels
                .entry(run_id)
                .or_insert_with(|| Arc::new(ProgressChannel::new(run_id))),
        )
    }

    pub fn get(&self, run_id: &Uuid) -> Option<Arc<ProgressChannel>> {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(run_id)
            .cloned()
    }

    pub fn remove(&self, run_id: &Uuid) -> Option<Arc<ProgressChannel>> {
        self.channels
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(run_id)
    }

    /// Attach an observer to a live run.
    pub fn subscribe(&self, run_id: Uuid) -> Option<RunSubscription> {
        let channel = self.get(&run_id)?;
        Some(RunSubscription {
            run_id,
            receiver: Some(channel.subscribe()),
            registry: self.clone(),
        })
    }

    /// Attach an observer that first replays the run's history, then follows
    /// live events.
    pub fn replay(&self, run_id: Uuid) -> Option<RunReplay> {
        let channel = self.get(&run_id)?;
        Some(RunReplay {
            run_id,
            stream: Some(channel.history_plus_stream().boxed()),
            registry: self.clone(),
        })
    }

    /// Drop the channel for `run_id` if the run has finished and nobody is
    /// listening any more. Returns whether the channel was removed.
    pub fn release_if_idle(&self, run_id: &Uuid) -> bool {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        let idle = channels
            .get(run_id)
            .map(|c| c.is_finished() && c.subscriber_count() == 0)
            .unwrap_or(false);

        if idle {
            channels.remove(run_id);
            debug!(run_id = %run_id, "Released progress channel");
        }
        idle
    }

    pub fn run_ids(&self) -> Vec<Uuid> {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.channels.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }
}

/// A live observer of one run. Dropping it releases the run's channel when
/// the run is already over.
pub struct RunSubscription {
    run_id: Uuid,
    receiver: Option<broadcast::Receiver<ProgressEnvelope>>,
    registry: RunRegistry,
}

impl RunSubscription {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Next event, skipping anything lost to lag. `None` once the channel is
    /// gone.
    pub async fn recv(&mut self) -> Option<ProgressEnvelope> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(run_id = %self.run_id, skipped, "Observer lagged behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for RunSubscription {
    fn drop(&mut self) {
        drop(self.receiver.take());
        self.registry.release_if_idle(&self.run_id);
    }
}

/// History followed by live events of one run. Dropping it releases the
/// run's channel when the run is already over.
pub struct RunReplay {
    run_id: Uuid,
    stream: Option<BoxStream<'static, ProgressEnvelope>>,
    registry: RunRegistry,
}

impl RunReplay {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

impl Stream for RunReplay {
    type Item = ProgressEnvelope;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.stream.as_mut() {
            Some(stream) => stream.poll_next_unpin(cx),
            None => Poll::Ready(None),
        }
    }
}

impl Drop for RunReplay {
    fn drop(&mut self) {
        drop(self.stream.take());
        self.registry.release_if_idle(&self.run_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProgressEvent, SYSTEM_SOURCE};

    #[test]
    fn test_registry_get_or_create() {
        let registry = RunRegistry::new();
        let run_id = Uuid::new_v4();

        let channel1 = registry.get_or_create(run_id);
        let channel2 = registry.get_or_create(run_id);

        assert_eq!(channel1.run_id(), channel2.run_id());
        assert!(Arc::ptr_eq(&channel1, &channel2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_remove() {
        let registry = RunRegistry::new();
        let run_id = Uuid::new_v4();

        registry.get_or_create(run_id);
        registry.remove(&run_id);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_runs_are_independent() {
        let registry = RunRegistry::new();
        let a = registry.get_or_create(Uuid::new_v4());
        let b = registry.get_or_create(Uuid::new_v4());

        a.publish(SYSTEM_SOURCE, "only in a");
        assert_eq!(a.history_len(), 1);
        assert_eq!(b.history_len(), 0);
        assert_eq!(registry.run_ids().len(), 2);
    }

    #[test]
    fn test_release_requires_finished_run() {
        let registry = RunRegistry::new();
        let run_id = Uuid::new_v4();
        let channel = registry.get_or_create(run_id);

        assert!(!registry.release_if_idle(&run_id));

        channel.publish_finished("completed", None);
        assert!(registry.release_if_idle(&run_id));
        assert!(registry.get(&run_id).is_none());
    }

    #[test]
    fn test_release_waits_for_observers() {
        let registry = RunRegistry::new();
        let run_id = Uuid::new_v4();
        let channel = registry.get_or_create(run_id);

        let subscription = registry.subscribe(run_id).unwrap();
        channel.publish_finished("completed", None);

        assert!(!registry.release_if_idle(&run_id));

        drop(subscription);
        assert!(registry.get(&run_id).is_none());
    }

    #[tokio::test]
    async fn test_dropping_replay_releases_finished_run() {
        let registry = RunRegistry::new();
        let run_id = Uuid::new_v4();
        let channel = registry.get_or_create(run_id);
        channel.publish(SYSTEM_SOURCE, "Color identity: G");

        let mut replay = registry.replay(run_id).unwrap();
        channel.publish_finished("completed", None);
        drop(channel);

        assert_eq!(
            replay.next().await.unwrap().event,
            ProgressEvent::message(SYSTEM_SOURCE, "Color identity: G")
        );
        assert!(replay.next().await.unwrap().event.is_terminal());
        assert!(!registry.release_if_idle(&run_id));

        drop(replay);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_dropping_replay_keeps_running_run() {
        let registry = RunRegistry::new();
        let run_id = Uuid::new_v4();
        registry.get_or_create(run_id);

        drop(registry.replay(run_id).unwrap());
        assert_eq!(registry.len(), 1);
        assert!(registry.replay(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_subscribe_unknown_run() {
        let registry = RunRegistry::new();
        assert!(registry.subscribe(Uuid::new_v4()).is_none());
    }

    #[tokio::test]
    async fn test_subscription_receives_until_closed() {
        let registry = RunRegistry::new();
        let run_id = Uuid::new_v4();
        let channel = registry.get_or_create(run_id);

        let mut subscription = registry.subscribe(run_id).unwrap();
        channel.publish("Agent-1", "Approved Sol Ring");
        channel.publish_finished("completed", None);

        let first = subscription.recv().await.unwrap();
        assert_eq!(first.event, ProgressEvent::message("Agent-1", "Approved Sol Ring"));
        let second = subscription.recv().await.unwrap();
        assert!(second.event.is_terminal());

        registry.remove(&run_id);
        drop(channel);
        assert!(subscription.recv().await.is_none());
    }
}
