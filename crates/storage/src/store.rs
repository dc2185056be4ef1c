//! Store traits and the SQLite implementation.

use crate::{Error, EventRow, Payload, Result};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Queue of events waiting to be sent.
pub trait EventStore: Send + Sync {
    /// Append a payload to the end of the queue.
    fn add_event(&self, payload: &Payload) -> Result<()>;

    /// Oldest `limit` rows, in insertion order.
    fn get_event_rows_batch(&self, limit: usize) -> Result<Vec<EventRow>>;

    fn get_all_event_rows(&self) -> Result<Vec<EventRow>>;

    fn delete_event_rows_with_ids(&self, ids: &[i64]) -> Result<()>;

    fn delete_all_event_rows(&self) -> Result<()>;

    fn count_events(&self) -> Result<usize>;
}

/// Persistence for the single client session record.
pub trait SessionStore: Send + Sync {
    fn get_session(&self) -> Result<Option<serde_json::Value>>;

    fn set_session(&self, session: &serde_json::Value) -> Result<()>;

    fn delete_session(&self) -> Result<()>;
}

/// SQLite-backed event and session store.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        // In-memory databases answer "memory" and keep that mode.
        let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY,
                data TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY,
                data TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::Lock)
    }

    /// Unreadable rows are deleted so they cannot hold a slot in every
    /// batch. A batch made only of such rows is fetched again.
    fn query_rows(&self, sql: &str, limit: Option<usize>) -> Result<Vec<EventRow>> {
        let conn = self.conn()?;

        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(i64, String)> {
            let id: i64 = row.get(0)?;
            let data: String = row.get(1)?;
            Ok((id, data))
        };

        loop {
            let raw: Vec<(i64, String)> = {
                let mut stmt = conn.prepare(sql)?;
                match limit {
                    Some(limit) => stmt
                        .query_map([limit as i64], map_row)?
                        .collect::<rusqlite::Result<_>>()?,
                    None => stmt.query_map([], map_row)?.collect::<rusqlite::Result<_>>()?,
                }
            };

            let mut rows = Vec::with_capacity(raw.len());
            let mut unreadable = Vec::new();
            for (id, data) in raw {
                match serde_json::from_str::<Payload>(&data) {
                    Ok(payload) => rows.push(EventRow { id, payload }),
                    Err(e) => {
                        tracing::warn!(row_id = id, error = %e, "dropping unreadable event row");
                        unreadable.push(id);
                    }
                }
            }
            delete_ids(&conn, &unreadable)?;

            if !rows.is_empty() || unreadable.is_empty() {
                return Ok(rows);
            }
        }
    }
}

impl EventStore for SqliteStorage {
    fn add_event(&self, payload: &Payload) -> Result<()> {
        let data = serde_json::to_string(payload)?;
        self.conn()?
            .execute("INSERT INTO events (data) VALUES (?1)", params![data])?;
        Ok(())
    }

    fn get_event_rows_batch(&self, limit: usize) -> Result<Vec<EventRow>> {
        self.query_rows(
            "SELECT id, data FROM events ORDER BY id ASC LIMIT ?1",
            Some(limit),
        )
    }

    fn get_all_event_rows(&self) -> Result<Vec<EventRow>> {
        self.query_rows("SELECT id, data FROM events ORDER BY id ASC", None)
    }

    fn delete_event_rows_with_ids(&self, ids: &[i64]) -> Result<()> {
        delete_ids(&*self.conn()?, ids)
    }

    fn delete_all_event_rows(&self) -> Result<()> {
        self.conn()?.execute("DELETE FROM events", [])?;
        Ok(())
    }

    fn count_events(&self) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn delete_ids(conn: &Connection, ids: &[i64]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!("DELETE FROM events WHERE id IN ({placeholders})");
    conn.execute(&sql, params_from_iter(ids.iter()))?;
    Ok(())
}

impl SessionStore for SqliteStorage {
    fn get_session(&self) -> Result<Option<serde_json::Value>> {
        let data: Option<String> = self
            .conn()?
            .query_row("SELECT data FROM sessions WHERE id = 1", [], |row| row.get(0))
            .optional()?;

        match data {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    fn set_session(&self, session: &serde_json::Value) -> Result<()> {
        let data = serde_json::to_string(session)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO sessions (id, data) VALUES (1, ?1)",
            params![data],
        )?;
        Ok(())
    }

    fn delete_session(&self) -> Result<()> {
        self.conn()?.execute("DELETE FROM sessions", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(event_id: &str) -> Payload {
        let mut payload = Payload::new();
        payload.add("e", "se");
        payload.add("eid", event_id);
        payload
    }

    #[test]
    fn batches_come_back_oldest_first() {
        let store = SqliteStorage::in_memory().unwrap();
        for i in 0..5 {
            store.add_event(&payload(&format!("event-{i}"))).unwrap();
        }

        let batch = store.get_event_rows_batch(3).unwrap();
        let ids: Vec<_> = batch.iter().map(|row| row.payload.get("eid").unwrap()).collect();
        assert_eq!(ids, ["event-0", "event-1", "event-2"]);
        assert_eq!(store.count_events().unwrap(), 5);
    }

    #[test]
    fn delete_by_ids_keeps_others() {
        let store = SqliteStorage::in_memory().unwrap();
        for i in 0..4 {
            store.add_event(&payload(&format!("event-{i}"))).unwrap();
        }
        let rows = store.get_all_event_rows().unwrap();
        let doomed: Vec<i64> = rows.iter().take(2).map(|row| row.id).collect();

        store.delete_event_rows_with_ids(&doomed).unwrap();
        store.delete_event_rows_with_ids(&[]).unwrap();

        let left = store.get_all_event_rows().unwrap();
        assert_eq!(left.len(), 2);
        assert_eq!(left[0].payload.get("eid"), Some("event-2"));

        store.delete_all_event_rows().unwrap();
        assert_eq!(store.count_events().unwrap(), 0);
    }

    #[test]
    fn session_record_is_replaced() {
        let store = SqliteStorage::in_memory().unwrap();
        assert!(store.get_session().unwrap().is_none());

        store.set_session(&json!({"sessionIndex": 1})).unwrap();
        store.set_session(&json!({"sessionIndex": 2})).unwrap();
        assert_eq!(store.get_session().unwrap(), Some(json!({"sessionIndex": 2})));

        store.delete_session().unwrap();
        assert!(store.get_session().unwrap().is_none());
    }

    #[test]
    fn corrupt_rows_are_skipped_and_dropped() {
        let store = SqliteStorage::in_memory().unwrap();
        store.add_event(&payload("good")).unwrap();
        store
            .conn()
            .unwrap()
            .execute("INSERT INTO events (data) VALUES ('not json')", [])
            .unwrap();
        assert_eq!(store.count_events().unwrap(), 2);

        let rows = store.get_all_event_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].payload.get("eid"), Some("good"));
        assert_eq!(store.count_events().unwrap(), 1);
    }

    #[test]
    fn corrupt_rows_do_not_hold_batch_slots() {
        let store = SqliteStorage::in_memory().unwrap();
        store
            .conn()
            .unwrap()
            .execute("INSERT INTO events (data) VALUES ('{broken')", [])
            .unwrap();
        store.add_event(&payload("behind")).unwrap();

        let batch = store.get_event_rows_batch(1).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].payload.get("eid"), Some("behind"));
        assert_eq!(store.count_events().unwrap(), 1);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.db");

        {
            let store = SqliteStorage::open(&path).unwrap();
            store.add_event(&payload("persisted")).unwrap();
            store.set_session(&json!({"userId": "abc"})).unwrap();
        }

        let store = SqliteStorage::open(&path).unwrap();
        assert_eq!(store.count_events().unwrap(), 1);
        assert_eq!(store.get_session().unwrap(), Some(json!({"userId": "abc"})));
    }
}
