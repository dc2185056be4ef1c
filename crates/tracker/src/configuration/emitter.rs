use super::{StoreSource, validate_db_path};
use crate::{EmitCallback, EmitStatus, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::{EventStore, SqliteStorage};

const DEFAULT_BATCH_SIZE: usize = 50;
const DEFAULT_BYTE_LIMIT: usize = 52_000;

/// Settings for the [`Emitter`](crate::Emitter): where events are queued,
/// how many are sent per round, and how large requests may grow.
#[derive(Clone)]
pub struct EmitterConfiguration {
    store: StoreSource<dyn EventStore>,
    batch_size: usize,
    byte_limit_get: usize,
    byte_limit_post: usize,
    request_callback: Option<(EmitCallback, Vec<EmitStatus>)>,
    custom_retry_for_status_codes: HashMap<u16, bool>,
}

impl EmitterConfiguration {
    /// Queue events in an existing store.
    pub fn with_store(store: Arc<dyn EventStore>) -> Self {
        Self::from_source(StoreSource::Store(store))
    }

    /// Queue events in a SQLite database at `path`.
    pub fn with_db_path(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::from_source(StoreSource::DbPath(validate_db_path(path.into())?)))
    }

    fn from_source(store: StoreSource<dyn EventStore>) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
            byte_limit_get: DEFAULT_BYTE_LIMIT,
            byte_limit_post: DEFAULT_BYTE_LIMIT,
            request_callback: None,
            custom_retry_for_status_codes: HashMap::new(),
        }
    }

    /// Maximum number of events read from the store per round.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn byte_limit_get(mut self, limit: usize) -> Self {
        self.byte_limit_get = limit;
        self
    }

    pub fn byte_limit_post(mut self, limit: usize) -> Self {
        self.byte_limit_post = limit;
        self
    }

    /// Call `callback` for every group of events reaching one of `statuses`.
    pub fn request_callback(mut self, callback: EmitCallback, statuses: &[EmitStatus]) -> Self {
        self.request_callback = Some((callback, statuses.to_vec()));
        self
    }

    /// Retry (or not) failures with this status code, overriding the
    /// defaults. Only codes from 300 up are accepted by the emitter.
    pub fn custom_retry_for_status_code(mut self, status_code: u16, retry: bool) -> Self {
        self.custom_retry_for_status_codes.insert(status_code, retry);
        self
    }

    pub fn custom_retry_for_status_codes(mut self, rules: HashMap<u16, bool>) -> Self {
        self.custom_retry_for_status_codes = rules;
        self
    }

    pub fn get_batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn get_byte_limit_get(&self) -> usize {
        self.byte_limit_get
    }

    pub fn get_byte_limit_post(&self) -> usize {
        self.byte_limit_post
    }

    pub fn get_request_callback(&self) -> Option<&(EmitCallback, Vec<EmitStatus>)> {
        self.request_callback.as_ref()
    }

    pub fn get_custom_retry_for_status_codes(&self) -> &HashMap<u16, bool> {
        &self.custom_retry_for_status_codes
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.store.db_path()
    }

    /// The configured store, opening the database if given a path.
    pub fn event_store(&self) -> Result<Arc<dyn EventStore>> {
        match &self.store {
            StoreSource::Store(store) => Ok(Arc::clone(store)),
            StoreSource::DbPath(path) => Ok(Arc::new(SqliteStorage::open(path)?)),
        }
    }

    pub(crate) fn set_event_store(&mut self, store: Arc<dyn EventStore>) {
        self.store = StoreSource::Store(store);
    }
}
