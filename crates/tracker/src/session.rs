//! Client session tracking.

use crate::constants::{
    SCHEMA_CLIENT_SESSION, SESSION_EVENT_INDEX, SESSION_FIRST_ID, SESSION_FIRST_TIMESTAMP,
    SESSION_ID, SESSION_INDEX, SESSION_PREVIOUS_ID, SESSION_STORAGE, SESSION_USER_ID,
};
use crate::{Error, Result, SelfDescribingJson, SessionConfiguration, utils};
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use storage::SessionStore;

const STORAGE_MECHANISM: &str = "SQLITE";

/// Tracks user sessions and produces the `client_session` context entity.
///
/// A new session starts on the first event, after a period of inactivity
/// longer than the foreground or background timeout, or when requested
/// with [`start_new_session`](Self::start_new_session). The user id and
/// session index persist in the [`SessionStore`] across restarts.
pub struct ClientSession {
    store: Arc<dyn SessionStore>,
    foreground_timeout: Duration,
    background_timeout: Duration,
    state: Mutex<SessionState>,
}

#[derive(Debug)]
struct SessionState {
    user_id: String,
    current_session_id: String,
    session_index: u64,
    event_index: u64,
    is_background: bool,
    is_new_session: bool,
    last_session_check_at: u64,
    context_data: Map<String, Value>,
}

impl ClientSession {
    /// Restore the stored session, if any. A stored record that cannot be
    /// read is discarded along with its user id.
    pub fn new(
        store: Arc<dyn SessionStore>,
        foreground_timeout: Duration,
        background_timeout: Duration,
    ) -> Result<Self> {
        let (restored, had_record) = match store.get_session() {
            Ok(Some(session)) => (restore(&session), true),
            Ok(None) => (None, false),
            Err(storage::Error::Serialization(e)) => {
                tracing::warn!(error = %e, "stored session is not valid json");
                (None, true)
            }
            Err(e) => return Err(e.into()),
        };

        let (user_id, current_session_id, session_index) = match restored {
            Some(restored) => restored,
            None => {
                if had_record {
                    tracing::warn!("discarding unreadable stored session");
                    store.delete_session()?;
                }
                (utils::uuid4(), String::new(), 0)
            }
        };

        Ok(Self {
            store,
            foreground_timeout,
            background_timeout,
            state: Mutex::new(SessionState {
                user_id,
                current_session_id,
                session_index,
                event_index: 0,
                is_background: false,
                is_new_session: true,
                last_session_check_at: utils::now_ms(),
                context_data: Map::new(),
            }),
        })
    }

    pub fn from_configuration(config: &SessionConfiguration) -> Result<Self> {
        Self::new(
            config.session_store()?,
            config.get_foreground_timeout(),
            config.get_background_timeout(),
        )
    }

    /// Context entity for an event, starting a new session first if needed.
    pub fn update_and_get_session_context(
        &self,
        event_id: &str,
        event_timestamp: u64,
    ) -> Result<SelfDescribingJson> {
        let (mut data, event_index, updated) = {
            let mut state = self.state()?;
            let updated = self.should_update_session(&state);
            if updated {
                state.update_session(event_id, event_timestamp);
            }
            state.last_session_check_at = utils::now_ms();
            state.event_index += 1;
            (state.context_data.clone(), state.event_index, updated)
        };

        if updated {
            self.store.set_session(&Value::Object(data.clone()))?;
        }

        data.insert(SESSION_EVENT_INDEX.into(), json!(event_index));
        Ok(SelfDescribingJson::new(SCHEMA_CLIENT_SESSION, Value::Object(data)))
    }

    /// Force a new session on the next event.
    pub fn start_new_session(&self) -> Result<()> {
        self.state()?.is_new_session = true;
        Ok(())
    }

    /// Switch between the foreground and background timeout. A session that
    /// already timed out under the previous state is ended.
    pub fn set_is_background(&self, is_background: bool) -> Result<()> {
        let mut state = self.state()?;
        if self.should_update_session(&state) {
            state.is_new_session = true;
        }
        state.last_session_check_at = utils::now_ms();
        state.is_background = is_background;
        Ok(())
    }

    pub fn is_background(&self) -> Result<bool> {
        Ok(self.state()?.is_background)
    }

    pub fn user_id(&self) -> Result<String> {
        Ok(self.state()?.user_id.clone())
    }

    fn state(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|_| Error::InvalidState("session lock poisoned".into()))
    }

    fn should_update_session(&self, state: &SessionState) -> bool {
        if state.is_new_session {
            return true;
        }
        let timeout = if state.is_background {
            self.background_timeout
        } else {
            self.foreground_timeout
        };
        let now = utils::now_ms();
        now < state.last_session_check_at
            || u128::from(now - state.last_session_check_at) > timeout.as_millis()
    }
}

impl SessionState {
    fn update_session(&mut self, event_id: &str, event_timestamp: u64) {
        let previous_session_id = std::mem::replace(&mut self.current_session_id, utils::uuid4());
        self.is_new_session = false;
        self.session_index += 1;
        self.event_index = 0;

        let mut data = Map::new();
        data.insert(SESSION_USER_ID.into(), json!(self.user_id));
        data.insert(SESSION_ID.into(), json!(self.current_session_id));
        data.insert(SESSION_INDEX.into(), json!(self.session_index));
        data.insert(SESSION_STORAGE.into(), json!(STORAGE_MECHANISM));
        data.insert(
            SESSION_PREVIOUS_ID.into(),
            if previous_session_id.is_empty() {
                Value::Null
            } else {
                json!(previous_session_id)
            },
        );
        if !event_id.is_empty() {
            data.insert(SESSION_FIRST_ID.into(), json!(event_id));
        }
        data.insert(
            SESSION_FIRST_TIMESTAMP.into(),
            json!(utils::ms_to_datetime_string(event_timestamp)),
        );
        self.context_data = data;
    }
}

fn restore(session: &Value) -> Option<(String, String, u64)> {
    Some((
        session.get(SESSION_USER_ID)?.as_str()?.to_string(),
        session.get(SESSION_ID)?.as_str()?.to_string(),
        session.get(SESSION_INDEX)?.as_u64()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::SqliteStorage;

    const LONG: Duration = Duration::from_secs(60);

    fn store() -> Arc<dyn SessionStore> {
        Arc::new(SqliteStorage::in_memory().unwrap())
    }

    #[test]
    fn first_event_starts_a_session() {
        let session = ClientSession::new(store(), LONG, LONG).unwrap();
        let context = session.update_and_get_session_context("event-1", 1_000).unwrap();
        let data = context.data();

        assert_eq!(context.schema(), SCHEMA_CLIENT_SESSION);
        assert_eq!(data["sessionIndex"], 1);
        assert_eq!(data["eventIndex"], 1);
        assert_eq!(data["firstEventId"], "event-1");
        assert_eq!(data["firstEventTimestamp"], "1970-01-01T00:00:01.000Z");
        assert_eq!(data["storageMechanism"], "SQLITE");
        assert!(data["previousSessionId"].is_null());
        assert_eq!(data["userId"], session.user_id().unwrap());
    }

    #[test]
    fn events_within_timeout_share_a_session() {
        let session = ClientSession::new(store(), LONG, LONG).unwrap();
        let first = session.update_and_get_session_context("a", 1).unwrap();
        let second = session.update_and_get_session_context("b", 2).unwrap();

        assert_eq!(first.data()["sessionId"], second.data()["sessionId"]);
        assert_eq!(second.data()["eventIndex"], 2);
        assert_eq!(second.data()["firstEventId"], "a");
    }

    #[test]
    fn timeout_starts_a_new_session() {
        let session = ClientSession::new(store(), Duration::from_millis(100), LONG).unwrap();
        let first = session.update_and_get_session_context("a", 1).unwrap();

        std::thread::sleep(Duration::from_millis(200));
        let second = session.update_and_get_session_context("b", 2).unwrap();

        assert_ne!(first.data()["sessionId"], second.data()["sessionId"]);
        assert_eq!(second.data()["previousSessionId"], first.data()["sessionId"]);
        assert_eq!(second.data()["sessionIndex"], 2);
        assert_eq!(second.data()["eventIndex"], 1);
        assert_eq!(second.data()["userId"], first.data()["userId"]);
    }

    #[test]
    fn background_uses_its_own_timeout() {
        let session = ClientSession::new(store(), LONG, Duration::from_millis(100)).unwrap();
        let first = session.update_and_get_session_context("a", 1).unwrap();

        session.set_is_background(true).unwrap();
        assert!(session.is_background().unwrap());
        std::thread::sleep(Duration::from_millis(200));

        let second = session.update_and_get_session_context("b", 2).unwrap();
        assert_eq!(second.data()["sessionIndex"], 2);
        assert_eq!(second.data()["previousSessionId"], first.data()["sessionId"]);
    }

    #[test]
    fn returning_to_foreground_after_timeout_starts_new_session() {
        let session = ClientSession::new(store(), LONG, Duration::from_millis(100)).unwrap();
        session.update_and_get_session_context("a", 1).unwrap();
        session.set_is_background(true).unwrap();
        std::thread::sleep(Duration::from_millis(200));

        session.set_is_background(false).unwrap();
        let context = session.update_and_get_session_context("b", 2).unwrap();
        assert_eq!(context.data()["sessionIndex"], 2);
    }

    #[test]
    fn start_new_session_is_honoured() {
        let session = ClientSession::new(store(), LONG, LONG).unwrap();
        session.update_and_get_session_context("a", 1).unwrap();
        session.start_new_session().unwrap();

        let context = session.update_and_get_session_context("b", 2).unwrap();
        assert_eq!(context.data()["sessionIndex"], 2);
        assert_eq!(context.data()["firstEventId"], "b");
    }

    #[test]
    fn session_survives_restart() {
        let store = store();
        let first = ClientSession::new(Arc::clone(&store), LONG, LONG).unwrap();
        let before = first.update_and_get_session_context("a", 1).unwrap();
        drop(first);

        let second = ClientSession::new(store, LONG, LONG).unwrap();
        let after = second.update_and_get_session_context("b", 2).unwrap();

        assert_eq!(after.data()["userId"], before.data()["userId"]);
        assert_eq!(after.data()["sessionIndex"], 2);
        assert_eq!(after.data()["previousSessionId"], before.data()["sessionId"]);
    }

    #[test]
    fn unreadable_session_is_replaced() {
        let store = store();
        store.set_session(&json!({"userId": 42})).unwrap();

        let session = ClientSession::new(Arc::clone(&store), LONG, LONG).unwrap();
        assert!(store.get_session().unwrap().is_none());

        let context = session.update_and_get_session_context("a", 1).unwrap();
        assert_eq!(context.data()["sessionIndex"], 1);
        assert!(context.data()["userId"].is_string());
    }

    #[test]
    fn persists_without_event_index() {
        let store = store();
        let session = ClientSession::new(Arc::clone(&store), LONG, LONG).unwrap();
        let context = session.update_and_get_session_context("a", 1).unwrap();

        let stored = store.get_session().unwrap().unwrap();
        assert_eq!(stored["sessionId"], context.data()["sessionId"]);
        assert!(stored.get("eventIndex").is_none());
    }
}
