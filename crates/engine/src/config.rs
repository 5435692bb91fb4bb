//! Engine configuration.
//!
//! Settings are read from a JSON file at `CADENCE_CONFIG_PATH` (tilde-expanded) or
//! `<config dir>/cadence/config.json`. A missing file yields defaults.
//!
//! ```json
//! {
//!   "httpTimeoutSecs": 10,
//!   "defaultWaitMs": 250,
//!   "maxNestingDepth": 8,
//!   "userAgent": "my-app/1.0"
//! }
//! ```
//!
//! Setting `maxNestingDepth` to `null` removes the `callWorkflow` nesting limit.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use cadence_util::expand_tilde;
use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{action::BuiltInOptions, action::default_user_agent, context::ExternalContextBuilder};

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "CADENCE_CONFIG_PATH";

/// Default `callWorkflow` nesting limit.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 16;

/// Error surfaced when reading configuration fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure reading the file.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid configuration JSON.
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tunables for the built-in actions and nested runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Timeout for `httpRequest`, in seconds.
    pub http_timeout_secs: u64,
    /// Sleep used by `wait` when `ms` is omitted, in milliseconds.
    pub default_wait_ms: u64,
    /// Maximum `callWorkflow` nesting depth; `None` is unbounded.
    pub max_nesting_depth: Option<usize>,
    /// User agent sent by `httpRequest`.
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: 30,
            default_wait_ms: 300,
            max_nesting_depth: Some(DEFAULT_MAX_NESTING_DEPTH),
            user_agent: default_user_agent(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&default_config_path())
    }

    /// Loads configuration from `path`, falling back to defaults when the file is absent.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found; using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Options for registering the built-in actions.
    pub fn built_in_options(&self) -> BuiltInOptions {
        BuiltInOptions::new(
            Duration::from_secs(self.http_timeout_secs),
            &self.user_agent,
            Duration::from_millis(self.default_wait_ms),
        )
    }

    /// Applies the nesting limit to an external context under construction.
    pub fn apply_to(&self, builder: ExternalContextBuilder) -> ExternalContextBuilder {
        builder.max_nesting_depth(self.max_nesting_depth)
    }
}

/// Returns the configuration file path.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("cadence").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExternalContext;

    #[test]
    fn default_path_honors_environment_override() {
        let override_path = "~/custom/cadence/config.json";
        temp_env::with_var(CONFIG_PATH_ENV, Some(override_path), || {
            assert_eq!(default_config_path(), expand_tilde(override_path));
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        let directory = tempfile::tempdir().expect("temp dir");
        let config = EngineConfig::load_from_path(&directory.path().join("absent.json")).expect("defaults");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_nesting_depth, Some(16));
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let directory = tempfile::tempdir().expect("temp dir");
        let path = directory.path().join("config.json");
        fs::write(&path, r#"{ "defaultWaitMs": 5, "maxNestingDepth": null }"#).expect("write");

        let config = EngineConfig::load_from_path(&path).expect("load");
        assert_eq!(config.default_wait_ms, 5);
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.max_nesting_depth, None);
        assert_eq!(config.built_in_options().default_wait, Duration::from_millis(5));

        let context = config.apply_to(ExternalContext::builder()).build();
        assert_eq!(context.max_nesting_depth(), None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let directory = tempfile::tempdir().expect("temp dir");
        let path = directory.path().join("config.json");
        fs::write(&path, "{ not json").expect("write");

        let error = EngineConfig::load_from_path(&path).expect_err("malformed");
        assert!(matches!(error, ConfigError::Json { .. }));
    }

    #[test]
    fn load_reads_from_environment_path() {
        let directory = tempfile::tempdir().expect("temp dir");
        let path = directory.path().join("engine.json");
        fs::write(&path, r#"{ "httpTimeoutSecs": 3 }"#).expect("write");

        let path_text = path.to_string_lossy().to_string();
        temp_env::with_var(CONFIG_PATH_ENV, Some(path_text.as_str()), || {
            let config = EngineConfig::load().expect("load");
            assert_eq!(config.http_timeout_secs, 3);
        });
    }
}
