//! Client settings and how they are resolved.

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1/";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOG_LEVEL: &str = "info";
const APP_DIR_NAME: &str = "docpress";

/// Errors raised while resolving a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML for [`ClientConfig`].
    #[error("failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// The file is not valid JSON for [`ClientConfig`].
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither YAML nor JSON.
    #[error("Unsupported configuration format. Use 'yaml' or 'json'.")]
    UnsupportedFormat,

    /// A setting or environment override has an unusable value.
    #[error("Invalid {name} value: {reason}")]
    InvalidValue {
        /// Setting or environment variable name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                name: "DOCPRESS_LOG_FORMAT",
                reason: format!("unknown log format '{other}'"),
            }),
        }
    }
}

/// Settings for talking to the DocPress backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the versioned API, e.g. `http://localhost:8000/api/v1/`.
    pub api_base_url: Url,

    /// Per-request timeout applied by the HTTP client.
    pub request_timeout_secs: u64,

    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Shape of emitted log lines.
    pub log_format: LogFormat,

    /// Directory holding the persisted bearer token. Falls back to the
    /// platform configuration directory when unset.
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Generates a default configuration.
    ///
    /// # Panics
    /// Never; the default URL is a valid constant.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default API URL is valid"),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Text,
            storage_dir: None,
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Values set in the file take precedence over environment variables, which
    /// only fill in settings still at their default.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment
    /// override is malformed, or the resolved configuration is invalid.
    pub fn load_config(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let defaults = Self::with_defaults();
        let mut config = Self::with_defaults();

        if let Some(path) = config_path {
            debug!(path = %path.display(), "loading configuration file");
            let content = fs::read_to_string(&path)?;
            config = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => serde_yml::from_str(&content)?,
                Some("json") => serde_json::from_str(&content)?,
                _ => return Err(ConfigError::UnsupportedFormat),
            };
        }

        if config.api_base_url == defaults.api_base_url {
            if let Ok(raw) = env::var("DOCPRESS_API_BASE_URL") {
                config.api_base_url =
                    Url::parse(&raw).map_err(|err| ConfigError::InvalidValue {
                        name: "DOCPRESS_API_BASE_URL",
                        reason: err.to_string(),
                    })?;
            }
        }
        if config.request_timeout_secs == defaults.request_timeout_secs {
            if let Ok(raw) = env::var("DOCPRESS_REQUEST_TIMEOUT_SECS") {
                config.request_timeout_secs =
                    raw.parse().map_err(|_| ConfigError::InvalidValue {
                        name: "DOCPRESS_REQUEST_TIMEOUT_SECS",
                        reason: "must be a whole number of seconds".to_string(),
                    })?;
            }
        }
        if config.log_level == defaults.log_level {
            if let Ok(level) = env::var("DOCPRESS_LOG_LEVEL") {
                config.log_level = level;
            }
        }
        if config.log_format == defaults.log_format {
            if let Ok(raw) = env::var("DOCPRESS_LOG_FORMAT") {
                config.log_format = raw.parse()?;
            }
        }
        if config.storage_dir.is_none() {
            if let Ok(dir) = env::var("DOCPRESS_STORAGE_DIR") {
                config.storage_dir = Some(PathBuf::from(dir));
            }
        }

        config.api_base_url = normalize_base(config.api_base_url);
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the client relies on.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for the first violated setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.api_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                name: "api_base_url",
                reason: format!("unsupported scheme '{}'", self.api_base_url.scheme()),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "request_timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Base URL with a trailing `/`, so relative joins keep the API prefix.
    #[must_use]
    pub fn api_root(&self) -> Url {
        normalize_base(self.api_base_url.clone())
    }

    /// Directory where the bearer token is persisted.
    #[must_use]
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            BaseDirs::new()
                .map(|dirs| dirs.config_dir().join(APP_DIR_NAME))
                .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR_NAME))
        })
    }
}

fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
