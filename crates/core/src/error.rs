use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown color symbol: {0}")]
    UnknownColor(String),

    #[error("{service} unavailable: {message}")]
    Collaborator { service: String, message: String },
}

impl CoreError {
    pub fn collaborator(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            service: service.into(),
            message: message.into(),
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CoreError::collaborator("scryfall", "connection refused");
        assert_eq!(error.to_string(), "scryfall unavailable: connection refused");

        let error = CoreError::UnknownColor("X".to_string());
        assert!(error.to_string().contains('X'));
    }
}
