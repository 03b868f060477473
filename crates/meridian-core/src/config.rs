//! Selector configuration (TOML).
//!
//! Missing fields default to the bundled dataset locations and a pipeline
//! that never retries, so an absent file behaves like the built-in constants.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default location of the country dataset (relative to `base_dir`).
pub const COUNTRIES_RESOURCE: &str = "countries/iso_3166.json";

/// Default location of the subdivision dataset (relative to `base_dir`).
pub const SUBDIVISIONS_RESOURCE: &str = "countries/iso_3166_2.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SelectorConfig {
    pub resources: ResourceConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResourceConfig {
    /// Directory the resource ids are resolved against.
    pub base_dir: PathBuf,
    pub countries: String,
    pub subdivisions: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("data"),
            countries: COUNTRIES_RESOURCE.to_string(),
            subdivisions: SUBDIVISIONS_RESOURCE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Records buffered between a reader and a loader.
    pub channel_capacity: usize,

    /// Clear the progress flag when a stage fails.
    ///
    /// `false` keeps the flag raised after a transfer error; consumers then
    /// have to watch the load state to notice the failure.
    pub clear_progress_on_failure: bool,

    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            clear_progress_on_failure: true,
            retry: RetryPolicy::default(),
        }
    }
}

/// Retry policy for transfer failures within one stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per stage (1 = no retry).
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Upper bound for a single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 500,
            multiplier: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_attempts(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay_ms: base_delay.as_millis() as u64,
            ..Self::default()
        }
    }

    /// Delay before the next attempt.
    ///
    /// `attempts` is the number of attempts already made (1-indexed):
    /// delay = min(base_delay * multiplier^(attempts - 1), max_delay)
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let max = Duration::from_millis(self.max_delay_ms);
        let exponent = attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_secs = Duration::from_millis(self.base_delay_ms).as_secs_f64();
        let delay_secs = base_secs * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(delay_secs).map_or(max, |delay| delay.min(max))
    }

    /// Is another attempt allowed after `attempts` failures?
    pub fn allows_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resources.countries.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "resources.countries must not be empty".to_string(),
            ));
        }
        if self.resources.subdivisions.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "resources.subdivisions must not be empty".to_string(),
            ));
        }
        if self.pipeline.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.channel_capacity must be > 0".to_string(),
            ));
        }
        if self.pipeline.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.retry.max_attempts must be > 0".to_string(),
            ));
        }
        if !(self.pipeline.retry.multiplier.is_finite() && self.pipeline.retry.multiplier >= 1.0) {
            return Err(ConfigError::Invalid(
                "pipeline.retry.multiplier must be a finite number >= 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SelectorConfig::default()`.
pub fn load_config(path: &Path) -> Result<SelectorConfig, ConfigError> {
    if !path.exists() {
        return Ok(SelectorConfig::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

fn parse_config(raw: &str) -> Result<SelectorConfig, toml::de::Error> {
    toml::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("meridian.toml")).unwrap();
        assert_eq!(config, SelectorConfig::default());
        assert_eq!(config.resources.countries, COUNTRIES_RESOURCE);
        assert_eq!(config.pipeline.retry.max_attempts, 1);
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meridian.toml");
        fs::write(
            &path,
            r#"
[resources]
base_dir = "/srv/reference"

[pipeline]
clear_progress_on_failure = false

[pipeline.retry]
max_attempts = 3
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.resources.base_dir, PathBuf::from("/srv/reference"));
        assert_eq!(config.resources.subdivisions, SUBDIVISIONS_RESOURCE);
        assert!(!config.pipeline.clear_progress_on_failure);
        assert_eq!(config.pipeline.retry.max_attempts, 3);
        assert_eq!(config.pipeline.retry.base_delay_ms, 500);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meridian.toml");
        fs::write(&path, "[pipeline]\nchannel_capacity = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("channel_capacity")));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meridian.toml");
        fs::write(&path, "[pipeline\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn exponential_backoff_increases() {
        let policy = RetryPolicy::with_attempts(5, Duration::from_secs(2));

        assert_eq!(policy.next_delay(1), Duration::from_secs(2));
        assert_eq!(policy.next_delay(2), Duration::from_secs(4));
        assert_eq!(policy.next_delay(3), Duration::from_secs(8));
        assert!(policy.allows_retry(4));
        assert!(!policy.allows_retry(5));
    }

    #[test]
    fn backoff_is_capped_instead_of_overflowing() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            multiplier: 1e300,
            max_delay_ms: 250,
        };
        let mut config = SelectorConfig::default();
        config.pipeline.retry = policy.clone();
        assert!(config.validate().is_ok());

        assert_eq!(policy.next_delay(1), Duration::from_millis(1));
        assert_eq!(policy.next_delay(2), Duration::from_millis(250));
        assert_eq!(policy.next_delay(u32::MAX), Duration::from_millis(250));
    }

    #[test]
    fn default_policy_never_retries() {
        assert!(!RetryPolicy::none().allows_retry(1));
    }
}
