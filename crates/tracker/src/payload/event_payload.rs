use crate::constants::{EID, TIMESTAMP};
use crate::utils;
use storage::Payload;

/// Payload of a single tracked event.
///
/// Every event payload is born with an event id (`eid`) and a device
/// created timestamp (`dtm`).
#[derive(Debug, Clone, PartialEq)]
pub struct EventPayload {
    payload: Payload,
    event_id: String,
    timestamp: u64,
}

impl EventPayload {
    pub fn new() -> Self {
        let event_id = utils::uuid4();
        let timestamp = utils::now_ms();

        let mut payload = Payload::new();
        payload.add(EID, event_id.as_str());
        payload.add(TIMESTAMP, timestamp.to_string());

        Self {
            payload,
            event_id,
            timestamp,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Creation time in milliseconds since the epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.payload.add(key, value);
    }

    pub fn add_map<K, V>(&mut self, map: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.payload.add_map(map);
    }

    pub fn add_payload(&mut self, other: &Payload) {
        self.payload.add_payload(other);
    }

    pub fn add_json(&mut self, json: &serde_json::Value, base64: bool, encoded: &str, plain: &str) {
        self.payload.add_json(json, base64, encoded, plain);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.payload.get(key)
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

impl Default for EventPayload {
    fn default() -> Self {
        Self::new()
    }
}
