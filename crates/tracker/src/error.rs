use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("tracker already registered for namespace: {0}")]
    AlreadyRegistered(String),

    #[error("no tokio runtime available to run the emitter")]
    NoRuntime,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] storage::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
