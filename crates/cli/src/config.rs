use std::path::Path;

use orchestrator::PipelineConfig;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "deckforge.toml";

pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";
pub const MODEL_ENV: &str = "DECKFORGE_MODEL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OracleSettings {
    pub base_url: String,
    pub model: String,
    /// System prompt sent with every oracle request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            base_url: oracle::DEFAULT_BASE_URL.to_string(),
            model: oracle::DEFAULT_MODEL.to_string(),
            system: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScryfallSettings {
    pub base_url: String,
}

impl Default for ScryfallSettings {
    fn default() -> Self {
        Self {
            base_url: scryfall::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Contents of `deckforge.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeckforgeConfig {
    pub pipeline: PipelineConfig,
    pub oracle: OracleSettings,
    pub scryfall: ScryfallSettings,
}

impl DeckforgeConfig {
    /// Reads the config file, falling back to defaults when it is missing or
    /// broken.
    pub async fn read(config_path: &Path) -> Self {
        if !config_path.exists() {
            debug!(path = %config_path.display(), "Config file does not exist, using defaults");
            return Self::default();
        }

        match fs::read_to_string(config_path).await {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!(path = %config_path.display(), "Config loaded successfully");
                    config
                }
                Err(e) => {
                    warn!(path = %config_path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "Failed to read config file, using defaults");
                Self::default()
            }
        }
    }

    pub async fn write(&self, config_path: &Path) -> std::io::Result<()> {
        if let Some(dir) = config_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).await?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(config_path, content).await?;
        debug!(path = %config_path.display(), "Config saved successfully");

        Ok(())
    }

    /// Applies `OLLAMA_HOST` and `DECKFORGE_MODEL` on top of the file values.
    pub fn with_env_overrides<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var(OLLAMA_HOST_ENV).filter(|v| !v.trim().is_empty()) {
            self.oracle.base_url = normalize_host(&host);
        }
        if let Some(model) = var(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.oracle.model = model.trim().to_string();
        }
        self
    }
}

/// `OLLAMA_HOST` is often given without a scheme (`127.0.0.1:11434`).
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let config = DeckforgeConfig::read(&temp_dir.path().join(CONFIG_FILE)).await;
        assert_eq!(config, DeckforgeConfig::default());
    }

    #[tokio::test]
    async fn test_config_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "[pipeline]\nbatch_size = 5\nshuffle_seed = 42\n\n[oracle]\nmodel = \"mistral\"\n",
        )
        .unwrap();

        let config = DeckforgeConfig::read(&path).await;
        assert_eq!(config.pipeline.batch_size, 5);
        assert_eq!(config.pipeline.shuffle_seed, Some(42));
        assert_eq!(config.pipeline.deck_size, 100);
        assert_eq!(config.oracle.model, "mistral");
        assert_eq!(config.oracle.base_url, oracle::DEFAULT_BASE_URL);
        assert_eq!(config.scryfall.base_url, scryfall::DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn test_config_invalid_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[pipeline\nbatch_size = ").unwrap();

        let config = DeckforgeConfig::read(&path).await;
        assert_eq!(config, DeckforgeConfig::default());
    }

    #[tokio::test]
    async fn test_config_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = DeckforgeConfig::default();
        config.pipeline.non_land_target = 60;
        config.oracle.system = Some("You are a Magic expert.".to_string());
        config.write(&path).await.unwrap();

        let loaded = DeckforgeConfig::read(&path).await;
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_env_overrides() {
        let config = DeckforgeConfig::default().with_env_overrides(|key| match key {
            OLLAMA_HOST_ENV => Some("10.0.0.5:11434".to_string()),
            MODEL_ENV => Some(" qwen2 ".to_string()),
            _ => None,
        });
        assert_eq!(config.oracle.base_url, "http://10.0.0.5:11434");
        assert_eq!(config.oracle.model, "qwen2");

        let untouched = DeckforgeConfig::default().with_env_overrides(|_| Some(String::new()));
        assert_eq!(untouched, DeckforgeConfig::default());
    }
}
