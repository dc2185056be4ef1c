//! Snowplow event tracker.
//!
//! This crate tracks analytics events and delivers them to a Snowplow
//! collector. Events are queued in a local SQLite database (see the
//! `storage` crate) and sent by a background emitter, so tracking never
//! blocks on the network and nothing is lost while the collector is down.
//!
//! # Overview
//!
//! - **Tracker**: builds the event payload (event id, timestamps, subject,
//!   context entities) and queues it.
//! - **Emitter**: a tokio task sending queued events in GET or POST
//!   batches, retrying failures with exponential backoff.
//! - **ClientSession**: maintains the `client_session` context entity with
//!   foreground and background timeouts.
//! - **HttpClient**: the transport seam; [`ReqwestHttpClient`] by default.
//! - **Snowplow**: a process-wide registry of trackers by namespace.
//!
//! # Example
//!
//! ```no_run
//! use tracker::{
//!     EmitterConfiguration, Method, NetworkConfiguration, SessionConfiguration, Snowplow,
//!     StructuredEvent, TrackerConfiguration,
//! };
//!
//! # async fn example() -> tracker::Result<()> {
//! let tracker = Snowplow::create_tracker(
//!     TrackerConfiguration::new("shop").app_id("checkout"),
//!     &NetworkConfiguration::new("https://collector.example.com", Method::Post),
//!     &EmitterConfiguration::with_db_path("tracker.db")?,
//!     Some(&SessionConfiguration::with_db_path("tracker.db")?),
//!     None,
//! )?;
//!
//! let event = StructuredEvent::new("basket", "add").label("sku-42").value(2.0);
//! let event_id = tracker.track(&event)?;
//! println!("tracked {event_id}");
//!
//! tracker.flush().await?;
//! # Ok(())
//! # }
//! ```

mod configuration;
mod constants;
mod desktop;
mod emitter;
mod error;
mod events;
mod http;
mod payload;
mod registry;
mod session;
mod subject;
mod tracker;
mod utils;

#[cfg(test)]
mod testing;

// Configuration
pub use configuration::{
    EmitterConfiguration, NetworkConfiguration, SessionConfiguration, TrackerConfiguration,
};

// Delivery
pub use emitter::{EmitCallback, EmitStatus, Emitter, RetryDelay};
pub use http::{
    BoxFuture, CollectorUrl, HttpClient, HttpRequestResult, Method, Protocol, ReqwestHttpClient,
    ReqwestHttpClientBuilder,
};

// Events
pub use desktop::desktop_context;
pub use events::{
    Event, EventCommon, ScreenViewEvent, SelfDescribingEvent, StructuredEvent, TimingEvent,
};
pub use payload::{EventPayload, SelfDescribingJson};
pub use subject::Subject;

// Error types
pub use error::{Error, Result};

// Tracking
pub use registry::Snowplow;
pub use session::ClientSession;
pub use tracker::Tracker;
