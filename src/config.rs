//! Service configuration, read from `blogwire.toml`.
//!
//! Every key is optional and the file itself may be absent. Keys the service
//! does not recognize are logged and skipped rather than rejected, so a typo
//! shows up in the log instead of stopping startup.
use crate::extract::{DEFAULT_DESCRIPTION_MAX_CHARS, DEFAULT_WORDS_PER_MINUTE};
use crate::util::validate_feed_url;
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

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A value parsed but is not usable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level service configuration.
///
/// Any subset of keys may be given; the rest keep their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server listens on.
    pub bind_addr: String,

    /// The upstream RSS/Atom feed.
    pub feed_url: String,

    /// Upper bound on one feed request, body included.
    pub fetch_timeout_secs: u64,

    /// How long a fetched feed document may be reused before refetching.
    pub revalidate_secs: u64,

    /// Documents kept by the in-memory feed cache. 0 disables the cache.
    pub cache_capacity: usize,

    pub rate_limit: RateLimitConfig,

    pub extract: ExtractConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            feed_url: "https://example.com/feed.xml".to_string(),
            fetch_timeout_secs: 10,
            revalidate_secs: 3600,
            cache_capacity: 8,
            rate_limit: RateLimitConfig::default(),
            extract: ExtractConfig::default(),
        }
    }
}

/// `[rate_limit]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per client per window.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
        }
    }
}

/// `[extract]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Reading speed for reading-time estimates.
    pub words_per_minute: usize,

    /// Summary length before the `...` marker.
    pub description_max_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            description_max_chars: DEFAULT_DESCRIPTION_MAX_CHARS,
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Longest accepted rate-limit window (one year).
    const MAX_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

    /// Reads the config file at `path`.
    ///
    /// A missing or blank file gives the defaults. Malformed TOML is a
    /// [`ConfigError::Parse`] carrying the line; unknown keys only warn.
    ///
    /// Values are not checked here; call [`Config::validate`] after applying
    /// command-line overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        // from a maliciously large or corrupted config file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {} // Size is within limits, proceed
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content, path)
    }

    fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Untyped pass only to report unrecognized keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            warn_unknown_keys(&raw);
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            path = %path.display(),
            feed_url = %config.feed_url,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_feed_url(&self.feed_url)
            .map_err(|e| ConfigError::Invalid(format!("feed_url '{}': {}", self.feed_url, e)))?;

        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.max_requests must be greater than 0".to_string(),
            ));
        }
        if self.rate_limit.window_secs == 0 || self.rate_limit.window_secs > Self::MAX_WINDOW_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "rate_limit.window_secs must be between 1 and {}",
                Self::MAX_WINDOW_SECS
            )));
        }
        if self.extract.words_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "extract.words_per_minute must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn revalidate(&self) -> Duration {
        Duration::from_secs(self.revalidate_secs)
    }

    /// Rate-limit window. Only meaningful after [`Config::validate`].
    pub fn rate_limit_window(&self) -> chrono::TimeDelta {
        let secs = self.rate_limit.window_secs.min(Self::MAX_WINDOW_SECS);
        chrono::TimeDelta::seconds(secs as i64)
    }
}

fn warn_unknown_keys(raw: &toml::Table) {
    const KNOWN_KEYS: [&str; 7] = [
        "bind_addr",
        "feed_url",
        "fetch_timeout_secs",
        "revalidate_secs",
        "cache_capacity",
        "rate_limit",
        "extract",
    ];
    const KNOWN_RATE_LIMIT_KEYS: [&str; 2] = ["max_requests", "window_secs"];
    const KNOWN_EXTRACT_KEYS: [&str; 2] = ["words_per_minute", "description_max_chars"];

    for (key, value) in raw {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            continue;
        }
        let nested: &[&str] = match key.as_str() {
            "rate_limit" => &KNOWN_RATE_LIMIT_KEYS,
            "extract" => &KNOWN_EXTRACT_KEYS,
            _ => continue,
        };
        if let Some(table) = value.as_table() {
            for nested_key in table.keys() {
                if !nested.contains(&nested_key.as_str()) {
                    tracing::warn!(key = %format!("{key}.{nested_key}"), "Unknown key in config file, ignoring");
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("blogwire_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("blogwire.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.fetch_timeout_secs, 10);
        assert_eq!(config.revalidate_secs, 3600);
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.extract.words_per_minute, 200);
        assert_eq!(config.extract.description_max_chars, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/blogwire_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.rate_limit.max_requests, 10);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        cleanup(&path);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = write_config(
            "partial",
            "feed_url = \"https://blog.example.com/rss.xml\"\n[rate_limit]\nmax_requests = 3\n",
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_url, "https://blog.example.com/rss.xml");
        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.rate_limit.window_secs, 60); // default
        assert_eq!(config.extract, ExtractConfig::default());
        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
bind_addr = "0.0.0.0:3000"
feed_url = "https://blog.example.com/rss.xml"
fetch_timeout_secs = 5
revalidate_secs = 600
cache_capacity = 0

[rate_limit]
max_requests = 100
window_secs = 300

[extract]
words_per_minute = 250
description_max_chars = 160
"#;
        let path = write_config("full", content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.revalidate(), Duration::from_secs(600));
        assert_eq!(config.cache_capacity, 0);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit_window(), chrono::TimeDelta::seconds(300));
        assert_eq!(config.extract.words_per_minute, 250);
        assert_eq!(config.extract.description_max_chars, 160);
        assert!(config.validate().is_ok());
        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let content = r#"
feed_url = "https://blog.example.com/rss.xml"
totally_fake_key = "should not fail"

[rate_limit]
burst = 5
"#;
        let path = write_config("unknown", content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_url, "https://blog.example.com/rss.xml");
        cleanup(&path);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("wrongtype", "fetch_timeout_secs = \"ten\"\n");
        assert!(Config::load(&path).is_err());
        cleanup(&path);
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }

    #[test]
    fn test_validate_rejects_bad_feed_url() {
        let config = Config {
            feed_url: "ftp://example.com/feed".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.fetch_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rate_limit.max_requests = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rate_limit.window_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.extract.words_per_minute = 0;
        assert!(config.validate().is_err());
    }
}
