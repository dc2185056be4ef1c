//! Event payloads and self-describing JSON.

mod event_payload;
mod self_describing_json;

pub use event_payload::EventPayload;
pub use self_describing_json::SelfDescribingJson;
