//! Configuration for trackers and their components.
//!
//! Each component has its own configuration type, built with chained
//! setters and handed to [`Snowplow::create_tracker`](crate::Snowplow::create_tracker)
//! or directly to the component constructors.

mod emitter;
mod network;
mod session;
mod tracker;

pub use emitter::EmitterConfiguration;
pub use network::NetworkConfiguration;
pub use session::SessionConfiguration;
pub use tracker::TrackerConfiguration;

use std::path::PathBuf;
use std::sync::Arc;

/// Where a component keeps its data: an existing store, or a SQLite
/// database opened on demand.
pub(crate) enum StoreSource<S: ?Sized> {
    Store(Arc<S>),
    DbPath(PathBuf),
}

impl<S: ?Sized> Clone for StoreSource<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Store(store) => Self::Store(Arc::clone(store)),
            Self::DbPath(path) => Self::DbPath(path.clone()),
        }
    }
}

impl<S: ?Sized> StoreSource<S> {
    pub(crate) fn db_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Store(_) => None,
            Self::DbPath(path) => Some(path),
        }
    }
}

pub(crate) fn validate_db_path(path: PathBuf) -> crate::Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(crate::Error::InvalidArgument("database path is empty".into()));
    }
    Ok(path)
}
