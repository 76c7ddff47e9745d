//! Quote source configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::SourceError;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
// Small batch size to avoid URL length / throttling
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_PAUSE_MS: u64 = 200;

/// Settings for the HTTP quote source. Every field has a default, so a config
/// file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub batch_size: usize,
    /// Pause between batches.
    pub pause_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            pause_ms: DEFAULT_PAUSE_MS,
        }
    }
}

impl SourceConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let contents = fs::read_to_string(path)?;
        let mut config: SourceConfig = serde_json::from_str(&contents)?;
        if config.batch_size == 0 {
            config.batch_size = DEFAULT_BATCH_SIZE;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: SourceConfig = serde_json::from_str(r#"{ "timeout_secs": 3 }"#).unwrap();
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_load_rejects_zero_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("source.json");
        fs::write(&path, r#"{ "batch_size": 0, "pause_ms": 0 }"#).unwrap();
        let config = SourceConfig::load(&path).unwrap();

        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.pause_ms, 0);
    }
}
