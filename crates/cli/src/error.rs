//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The event database does not exist.
    ///
    /// This typically means nothing has been tracked yet.
    #[error("database not found at {path}. Run 'snowplow track' first")]
    DatabaseNotFound { path: PathBuf },

    /// Event properties given on the command line are not valid JSON.
    #[error("invalid JSON in --{arg}: {source}")]
    InvalidJson {
        arg: &'static str,
        source: serde_json::Error,
    },

    /// Configuration is invalid or missing required fields.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// An error occurred while tracking or sending.
    #[error(transparent)]
    Tracker(#[from] tracker::Error),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
