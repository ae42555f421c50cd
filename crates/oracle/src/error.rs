use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Ollama API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<OracleError> for deck_core::CoreError {
    fn from(err: OracleError) -> Self {
        deck_core::CoreError::collaborator("oracle", err.to_string())
    }
}

pub type OracleResult<T> = Result<T, OracleError>;
