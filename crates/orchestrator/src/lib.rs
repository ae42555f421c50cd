pub mod config;
pub mod error;
pub mod guard;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod service;
pub mod services;
pub mod state_machine;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::PipelineConfig;
pub use error::{OrchestratorError, Result};
pub use guard::Collaborators;
pub use pipeline::{RunOutcome, SelectionPipeline, SelectionState};
pub use progress::RunProgress;
pub use service::{DeckService, RunHandle};
pub use state_machine::{DeckPhase, DeckStateMachine};
