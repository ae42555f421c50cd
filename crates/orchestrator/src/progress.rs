//! Progress reporting for one run.

use std::sync::Arc;

use events::{ProgressChannel, ProgressEvent, SYSTEM_SOURCE};
use tracing::debug;
use uuid::Uuid;

use crate::state_machine::DeckPhase;

/// Publishes a run's progress lines onto its channel, in emission order.
#[derive(Clone)]
pub struct RunProgress {
    channel: Arc<ProgressChannel>,
}

impl RunProgress {
    pub fn new(channel: Arc<ProgressChannel>) -> Self {
        Self { channel }
    }

    /// Progress sink with no observers, for callers that only want the result.
    pub fn detached() -> Self {
        Self::new(Arc::new(ProgressChannel::new(Uuid::new_v4())))
    }

    pub fn run_id(&self) -> Uuid {
        self.channel.run_id()
    }

    pub fn channel(&self) -> &Arc<ProgressChannel> {
        &self.channel
    }

    pub fn system(&self, message: impl Into<String>) {
        self.publish(SYSTEM_SOURCE, message);
    }

    pub fn publish(&self, source: &str, message: impl Into<String>) {
        let message = message.into();
        debug!(run_id = %self.run_id(), source = %source, "{}", message);
        self.channel.publish(source, message);
    }

    pub fn phase_changed(&self, from: DeckPhase, to: DeckPhase) {
        self.channel.publish_event(ProgressEvent::PhaseChanged {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        });
    }

    pub fn finished(&self, status: &str, error: Option<String>) {
        self.channel.publish_finished(status, error);
    }
}
