use serde::Deserialize;

use crate::models::batch::MAX_LABELS_PER_BATCH;
use crate::services::batch::DEFAULT_CONCURRENCY;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000")
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// OpenAI API key. Without it every extraction fails and labels report FAIL.
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// Vision-capable model used for field extraction
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// API base URL (overridable for local testing)
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Per-request timeout for extraction calls
    #[serde(default = "default_openai_timeout_seconds")]
    pub openai_timeout_seconds: u64,

    /// Directory holding uploaded label images
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Maximum labels accepted per batch (clamped to 1..=100)
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Label pipelines allowed to run at once within one batch
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,

    /// Finished batch snapshots retained for export
    #[serde(default = "default_batch_store_capacity")]
    pub batch_store_capacity: usize,

    /// Seconds a snapshot stays exportable
    #[serde(default = "default_batch_ttl_seconds")]
    pub batch_ttl_seconds: u64,

    /// Request body limit in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_openai_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_timeout_seconds() -> u64 {
    60
}

fn default_upload_dir() -> String {
    "tmp/uploads".to_string()
}

fn default_max_batch_size() -> usize {
    MAX_LABELS_PER_BATCH
}

fn default_batch_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_batch_store_capacity() -> usize {
    256
}

fn default_batch_ttl_seconds() -> u64 {
    24 * 60 * 60
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            openai_base_url: default_openai_base_url(),
            openai_timeout_seconds: default_openai_timeout_seconds(),
            upload_dir: default_upload_dir(),
            max_batch_size: default_max_batch_size(),
            batch_concurrency: default_batch_concurrency(),
            batch_store_capacity: default_batch_store_capacity(),
            batch_ttl_seconds: default_batch_ttl_seconds(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Batch limit actually enforced.
    pub fn effective_max_batch_size(&self) -> usize {
        self.max_batch_size.clamp(1, MAX_LABELS_PER_BATCH)
    }

    /// Blank keys count as unset.
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_env() {
        let config: AppConfig = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.openai_model, "gpt-4.1-mini");
        assert_eq!(config.max_batch_size, 100);
        assert_eq!(config.batch_concurrency, 10);
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let vars = vec![
            ("OPENAI_API_KEY".to_string(), "sk-test".to_string()),
            ("MAX_BATCH_SIZE".to_string(), "25".to_string()),
            ("BATCH_CONCURRENCY".to_string(), "4".to_string()),
        ];
        let config: AppConfig = envy::from_iter(vars).unwrap();
        assert_eq!(config.api_key(), Some("sk-test"));
        assert_eq!(config.effective_max_batch_size(), 25);
        assert_eq!(config.batch_concurrency, 4);
    }

    #[test]
    fn test_batch_size_is_clamped() {
        let mut config = AppConfig::default();
        config.max_batch_size = 500;
        assert_eq!(config.effective_max_batch_size(), 100);
        config.max_batch_size = 0;
        assert_eq!(config.effective_max_batch_size(), 1);
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config = AppConfig {
            openai_api_key: Some("  ".to_string()),
            ..AppConfig::default()
        };
        assert!(config.api_key().is_none());
    }
}
