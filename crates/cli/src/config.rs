//! Configuration loading from snowplow.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracker::{
    EmitterConfiguration, Method, NetworkConfiguration, SessionConfiguration, TrackerConfiguration,
};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collector: CollectorConfig,
    pub tracker: TrackerConfig,
    pub emitter: EmitterConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Where events are sent.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Collector endpoint, with or without scheme. Required to send.
    pub url: Option<String>,

    /// "get" or "post".
    pub method: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            url: None,
            method: "post".to_string(),
        }
    }
}

/// Parameters attached to every tracked event.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub namespace: String,
    pub app_id: Option<String>,
    pub platform: String,
    pub base64: bool,
    pub desktop_context: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            namespace: "snowplow-cli".to_string(),
            app_id: None,
            platform: "srv".to_string(),
            base64: true,
            desktop_context: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Event queue database. Defaults to the platform data directory.
    pub db_path: Option<PathBuf>,
    pub batch_size: usize,
    pub byte_limit_get: usize,
    pub byte_limit_post: usize,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            batch_size: 50,
            byte_limit_get: 52_000,
            byte_limit_post: 52_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub enabled: bool,
    pub foreground_timeout_secs: u64,
    pub background_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            foreground_timeout_secs: 1800,
            background_timeout_secs: 1800,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The event database, falling back to `default` when unset.
    pub fn db_path(&self, default: &Path) -> PathBuf {
        self.emitter
            .db_path
            .clone()
            .unwrap_or_else(|| default.to_path_buf())
    }

    pub fn method(&self) -> Result<Method, ConfigError> {
        self.collector
            .method
            .parse()
            .map_err(|_| ConfigError::InvalidMethod(self.collector.method.clone()))
    }

    pub fn network(&self) -> Result<NetworkConfiguration, ConfigError> {
        let url = self
            .collector
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingCollector)?;
        Ok(NetworkConfiguration::new(url, self.method()?))
    }

    pub fn tracker(&self) -> TrackerConfiguration {
        let mut config = TrackerConfiguration::new(&self.tracker.namespace)
            .platform(&self.tracker.platform)
            .use_base64(self.tracker.base64)
            .desktop_context(self.tracker.desktop_context);
        if let Some(app_id) = &self.tracker.app_id {
            config = config.app_id(app_id);
        }
        config
    }

    pub fn emitter(&self, db_path: &Path) -> tracker::Result<EmitterConfiguration> {
        Ok(EmitterConfiguration::with_db_path(db_path)?
            .batch_size(self.emitter.batch_size)
            .byte_limit_get(self.emitter.byte_limit_get)
            .byte_limit_post(self.emitter.byte_limit_post))
    }

    /// Session settings, or `None` when session tracking is disabled.
    pub fn session(&self, db_path: &Path) -> tracker::Result<Option<SessionConfiguration>> {
        if !self.session.enabled {
            return Ok(None);
        }
        Ok(Some(
            SessionConfiguration::with_db_path(db_path)?
                .foreground_timeout(Duration::from_secs(self.session.foreground_timeout_secs))
                .background_timeout(Duration::from_secs(self.session.background_timeout_secs)),
        ))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("collector not configured: set collector.url")]
    MissingCollector,

    #[error("unknown collector.method '{0}': expected \"get\" or \"post\"")]
    InvalidMethod(String),
}
