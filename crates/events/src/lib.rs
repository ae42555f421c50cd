//! Progress events for deck generation runs.
//!
//! Every run owns one [`ProgressChannel`], a broadcast topic with a bounded
//! history. The [`RunRegistry`] keys channels by run id so observers can attach
//! while the run is in flight.

mod bus;
mod registry;
mod types;

pub use bus::ProgressChannel;
pub use registry::{RunRegistry, RunReplay, RunSubscription};
pub use types::*;
