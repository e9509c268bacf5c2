//! Configuration file parser for feedscout.toml.
//!
//! The config file is optional; a missing or empty file yields
//! `Config::default()`. Unknown keys are silently ignored by serde, though
//! we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Crawl configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified. Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Retries after the first attempt, for network failures and 5xx only.
    pub max_retries: u32,

    /// User-Agent header sent on every request. The default identifies the
    /// crawler; point it at a browser string for sites that block bots.
    pub user_agent: String,

    /// Concurrent candidate validations per site.
    pub concurrency: usize,

    /// Sites crawled in parallel across the batch.
    pub max_concurrent_sites: usize,

    /// Overall deadline per site, in seconds. When it fires, in-flight
    /// candidates are abandoned and the site reports whatever validated.
    pub site_deadline_secs: u64,

    /// Response bodies beyond this many bytes are truncated.
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            max_retries: 3,
            user_agent: format!(
                "feedscout/{} (+https://github.com/dhofheinz/feedscout)",
                env!("CARGO_PKG_VERSION")
            ),
            concurrency: 8,
            max_concurrent_sites: 4,
            site_deadline_secs: 60,
            max_body_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse as a raw table first to warn about unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "request_timeout_secs",
                "max_retries",
                "user_agent",
                "concurrency",
                "max_concurrent_sites",
                "site_deadline_secs",
                "max_body_bytes",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            timeout_secs = config.request_timeout_secs,
            retries = config.max_retries,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn site_deadline(&self) -> Duration {
        Duration::from_secs(self.site_deadline_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.max_retries, 3);
        assert!(config.user_agent.starts_with("feedscout/"));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.max_concurrent_sites, 4);
        assert_eq!(config.site_deadline_secs, 60);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/feedscout_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("feedscout_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "max_retries = 1\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.request_timeout_secs, 10); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("feedscout_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
request_timeout_secs = 5
max_retries = 2
user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
concurrency = 16
max_concurrent_sites = 2
site_deadline_secs = 30
max_body_bytes = 1048576
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.max_retries, 2);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.concurrency, 16);
        assert_eq!(config.max_concurrent_sites, 2);
        assert_eq!(config.site_deadline_secs, 30);
        assert_eq!(config.max_body_bytes, 1_048_576);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("feedscout_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("feedscout_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "totally_fake_key = \"ignored\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_retries, 3);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = std::env::temp_dir().join("feedscout_config_test_wrongtype");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "max_retries = \"three\"\n").unwrap();

        assert!(Config::load(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
