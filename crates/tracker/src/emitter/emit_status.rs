use std::sync::Arc;

/// Outcome of sending a group of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmitStatus {
    Success,
    /// Delivery failed; events stay queued.
    FailedWillRetry,
    /// Delivery failed; events are dropped.
    FailedWontRetry,
}

impl EmitStatus {
    pub const ALL: [EmitStatus; 3] = [
        EmitStatus::Success,
        EmitStatus::FailedWillRetry,
        EmitStatus::FailedWontRetry,
    ];
}

impl std::fmt::Display for EmitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::FailedWillRetry => write!(f, "failed_will_retry"),
            Self::FailedWontRetry => write!(f, "failed_wont_retry"),
        }
    }
}

/// Called with the event ids of each group of events that reached a status.
pub type EmitCallback = Arc<dyn Fn(Vec<String>, EmitStatus) + Send + Sync>;
