use async_trait::async_trait;
use deck_core::{CoreResult, TextOracle};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::{OracleError, OracleResult};
use crate::types::{GenerateRequest, GenerateResponse, OllamaErrorBody};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";

/// Client for the Ollama text generation API
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    system: Option<String>,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            system: None,
        }
    }

    /// System prompt sent with every request.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate_once(&self, request: &GenerateRequest) -> OracleResult<String> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OllamaErrorBody>(&error_text)
                .map(|body| body.error)
                .unwrap_or(error_text);

            if status == StatusCode::NOT_FOUND {
                return Err(OracleError::ModelNotFound(message));
            }
            return Err(OracleError::Api {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let body: GenerateResponse = response.json().await?;
        Ok(body.response)
    }

    /// Single non-streaming completion for `prompt`. Errors are returned as
    /// they come; callers decide what a failed call means.
    pub async fn complete(&self, prompt: &str) -> OracleResult<String> {
        let mut request = GenerateRequest::new(&self.model, prompt);
        if let Some(system) = &self.system {
            request = request.with_system(system.as_str());
        }

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending generate request");
        let text = self.generate_once(&request).await.map_err(|e| {
            warn!(model = %self.model, error = %e, "Generate request failed");
            e
        })?;
        debug!(model = %self.model, response_len = text.len(), "Generate request complete");

        Ok(text)
    }
}

#[async_trait]
impl TextOracle for OllamaClient {
    async fn generate(&self, prompt: &str) -> CoreResult<String> {
        Ok(self.complete(prompt).await?)
    }
}
