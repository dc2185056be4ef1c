//! SQLite-backed persistence for the Snowplow tracker.
//!
//! Events are queued here until the emitter manages to deliver them, so a
//! crash or a collector outage never loses tracked data. The same database
//! also keeps the client session record so session ids and indexes survive
//! process restarts.
//!
//! # Core Concepts
//!
//! ## Payload
//!
//! A [`Payload`] is an ordered map of tracker protocol parameters
//! (`e`, `eid`, `dtm`, ...). Empty keys and values are dropped on insert.
//!
//! ## EventStore
//!
//! The [`EventStore`] trait is the event queue: append, read the oldest
//! batch, delete delivered rows. Each stored payload comes back as an
//! [`EventRow`] carrying its row id.
//!
//! ## SessionStore
//!
//! The [`SessionStore`] trait keeps at most one session record as JSON.
//!
//! ## SqliteStorage
//!
//! [`SqliteStorage`] implements both traits on one SQLite database. A single
//! instance can be shared between the emitter and the client session.
//!
//! # Example
//!
//! ```no_run
//! use storage::{EventStore, Payload, SessionStore, SqliteStorage};
//!
//! let store = SqliteStorage::open("tracker.db")?;
//!
//! let mut payload = Payload::new();
//! payload.add("e", "se");
//! payload.add("se_ca", "shop");
//! store.add_event(&payload)?;
//!
//! for row in store.get_event_rows_batch(50)? {
//!     println!("{}: {:?}", row.id, row.payload);
//! }
//!
//! store.set_session(&serde_json::json!({"sessionIndex": 1}))?;
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod payload;
mod store;

pub use error::{Error, Result};
pub use payload::{EventRow, Payload};
pub use store::{EventStore, SessionStore, SqliteStorage};
