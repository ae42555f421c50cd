use thiserror::Error;

/// Scryfall-specific error types
#[derive(Debug, Error)]
pub enum ScryfallError {
    #[error("Scryfall API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Scryfall rate limited")]
    RateLimited,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ScryfallError> for deck_core::CoreError {
    fn from(err: ScryfallError) -> Self {
        deck_core::CoreError::collaborator("scryfall", err.to_string())
    }
}

/// Result type alias for Scryfall operations
pub type ScryfallResult<T> = Result<T, ScryfallError>;
