//! Process-wide registry of trackers by namespace.

use crate::{
    ClientSession, Emitter, EmitterConfiguration, Error, Method, NetworkConfiguration, Result,
    SessionConfiguration, Subject, Tracker, TrackerConfiguration,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use storage::{EventStore, SessionStore, SqliteStorage};

static REGISTRY: LazyLock<Mutex<Registry>> = LazyLock::new(|| Mutex::new(Registry::default()));

#[derive(Default)]
struct Registry {
    trackers: HashMap<String, Arc<Tracker>>,
    default_namespace: Option<String>,
}

fn registry() -> MutexGuard<'static, Registry> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Entry point for creating and looking up trackers.
///
/// Trackers created here are registered under their namespace. The first
/// registered tracker becomes the default one.
pub struct Snowplow;

impl Snowplow {
    /// Create, start and register a tracker from its configurations.
    ///
    /// When the emitter and session are configured with the same database
    /// path they share a single connection.
    pub fn create_tracker(
        tracker_config: TrackerConfiguration,
        network_config: &NetworkConfiguration,
        emitter_config: &EmitterConfiguration,
        session_config: Option<&SessionConfiguration>,
        subject: Option<Subject>,
    ) -> Result<Arc<Tracker>> {
        let namespace = tracker_config.get_namespace().to_string();
        if registry().trackers.contains_key(&namespace) {
            return Err(Error::AlreadyRegistered(namespace));
        }

        let mut emitter_config = emitter_config.clone();
        let mut session_config = session_config.cloned();
        if let Some(session_config) = session_config.as_mut() {
            let shared_path = match (emitter_config.db_path(), session_config.db_path()) {
                (Some(events_db), Some(session_db)) if events_db == session_db => {
                    Some(events_db.to_path_buf())
                }
                _ => None,
            };
            if let Some(path) = shared_path {
                let shared = Arc::new(SqliteStorage::open(path)?);
                emitter_config.set_event_store(Arc::clone(&shared) as Arc<dyn EventStore>);
                session_config.set_session_store(shared);
            }
        }

        let emitter = Emitter::new(network_config, &emitter_config)?;
        let session = session_config
            .as_ref()
            .map(ClientSession::from_configuration)
            .transpose()?;
        let tracker = Arc::new(Tracker::new(tracker_config, emitter, subject, session)?);

        Self::register_tracker(Arc::clone(&tracker))?;
        tracing::info!(namespace = %tracker.namespace(), "tracker created");
        Ok(tracker)
    }

    /// Create a tracker queueing events (and the session, if tracked) in the
    /// SQLite database at `db_path`.
    pub fn create_tracker_with_db(
        namespace: &str,
        collector_url: &str,
        method: Method,
        db_path: impl Into<PathBuf>,
        subject: Option<Subject>,
        session_tracking: bool,
    ) -> Result<Arc<Tracker>> {
        let db_path = db_path.into();
        let emitter_config = EmitterConfiguration::with_db_path(&db_path)?;
        let session_config = if session_tracking {
            Some(SessionConfiguration::with_db_path(&db_path)?)
        } else {
            None
        };

        Self::create_tracker(
            TrackerConfiguration::new(namespace),
            &NetworkConfiguration::new(collector_url, method),
            &emitter_config,
            session_config.as_ref(),
            subject,
        )
    }

    /// Create a tracker on existing stores. Without a session store no
    /// session context is tracked.
    pub fn create_tracker_with_stores(
        namespace: &str,
        collector_url: &str,
        method: Method,
        event_store: Arc<dyn EventStore>,
        session_store: Option<Arc<dyn SessionStore>>,
        subject: Option<Subject>,
    ) -> Result<Arc<Tracker>> {
        let session_config = session_store.map(SessionConfiguration::with_store);
        Self::create_tracker(
            TrackerConfiguration::new(namespace),
            &NetworkConfiguration::new(collector_url, method),
            &EmitterConfiguration::with_store(event_store),
            session_config.as_ref(),
            subject,
        )
    }

    /// Register a tracker under its namespace.
    pub fn register_tracker(tracker: Arc<Tracker>) -> Result<()> {
        let mut registry = registry();
        let namespace = tracker.namespace().to_string();
        if registry.trackers.contains_key(&namespace) {
            return Err(Error::AlreadyRegistered(namespace));
        }
        if registry.default_namespace.is_none() {
            registry.default_namespace = Some(namespace.clone());
        }
        registry.trackers.insert(namespace, tracker);
        Ok(())
    }

    pub fn get_tracker(namespace: &str) -> Option<Arc<Tracker>> {
        registry().trackers.get(namespace).cloned()
    }

    /// Unregister a tracker. Returns it if it was registered.
    pub fn remove_tracker(namespace: &str) -> Option<Arc<Tracker>> {
        let mut registry = registry();
        let removed = registry.trackers.remove(namespace);
        if registry.default_namespace.as_deref() == Some(namespace) {
            registry.default_namespace = None;
        }
        removed
    }

    /// Make `tracker` the default, registering it if needed.
    pub fn set_default_tracker(tracker: Arc<Tracker>) -> Result<()> {
        let mut registry = registry();
        let namespace = tracker.namespace().to_string();
        match registry.trackers.get(&namespace) {
            Some(existing) if !Arc::ptr_eq(existing, &tracker) => {
                return Err(Error::AlreadyRegistered(namespace));
            }
            Some(_) => {}
            None => {
                registry.trackers.insert(namespace.clone(), tracker);
            }
        }
        registry.default_namespace = Some(namespace);
        Ok(())
    }

    pub fn get_default_tracker() -> Option<Arc<Tracker>> {
        let registry = registry();
        let namespace = registry.default_namespace.as_ref()?;
        registry.trackers.get(namespace).cloned()
    }
}
