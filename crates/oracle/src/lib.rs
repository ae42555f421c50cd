//! Text oracle backed by a local Ollama server.

pub mod client;
pub mod error;
pub mod types;

pub use client::{OllamaClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::{OracleError, OracleResult};
