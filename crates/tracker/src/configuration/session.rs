use super::{StoreSource, validate_db_path};
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use storage::{SessionStore, SqliteStorage};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Settings for client session tracking.
#[derive(Clone)]
pub struct SessionConfiguration {
    store: StoreSource<dyn SessionStore>,
    foreground_timeout: Duration,
    background_timeout: Duration,
}

impl SessionConfiguration {
    pub fn with_store(store: Arc<dyn SessionStore>) -> Self {
        Self::from_source(StoreSource::Store(store))
    }

    pub fn with_db_path(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::from_source(StoreSource::DbPath(validate_db_path(path.into())?)))
    }

    fn from_source(store: StoreSource<dyn SessionStore>) -> Self {
        Self {
            store,
            foreground_timeout: DEFAULT_TIMEOUT,
            background_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Inactivity allowed in the foreground before a new session starts.
    pub fn foreground_timeout(mut self, timeout: Duration) -> Self {
        self.foreground_timeout = timeout;
        self
    }

    /// Inactivity allowed in the background before a new session starts.
    pub fn background_timeout(mut self, timeout: Duration) -> Self {
        self.background_timeout = timeout;
        self
    }

    pub fn get_foreground_timeout(&self) -> Duration {
        self.foreground_timeout
    }

    pub fn get_background_timeout(&self) -> Duration {
        self.background_timeout
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.store.db_path()
    }

    pub fn session_store(&self) -> Result<Arc<dyn SessionStore>> {
        match &self.store {
            StoreSource::Store(store) => Ok(Arc::clone(store)),
            StoreSource::DbPath(path) => Ok(Arc::new(SqliteStorage::open(path)?)),
        }
    }

    pub(crate) fn set_session_store(&mut self, store: Arc<dyn SessionStore>) {
        self.store = StoreSource::Store(store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_thirty_minutes() {
        let config = SessionConfiguration::with_db_path("sessions.db").unwrap();
        assert_eq!(config.get_foreground_timeout(), Duration::from_secs(1800));
        assert_eq!(config.get_background_timeout(), Duration::from_secs(1800));
        assert_eq!(config.db_path(), Some(Path::new("sessions.db")));
    }

    #[test]
    fn custom_timeouts() {
        let store: Arc<dyn SessionStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        let config = SessionConfiguration::with_store(store)
            .foreground_timeout(Duration::from_secs(5))
            .background_timeout(Duration::from_secs(10));

        assert_eq!(config.get_foreground_timeout(), Duration::from_secs(5));
        assert_eq!(config.get_background_timeout(), Duration::from_secs(10));
        assert!(config.db_path().is_none());
    }

    #[test]
    fn empty_db_path_is_rejected() {
        assert!(SessionConfiguration::with_db_path("").is_err());
    }
}
