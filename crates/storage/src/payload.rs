//! Key/value payloads as queued and sent to the collector.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An ordered map of tracker protocol parameters.
///
/// Empty keys and empty values are never stored, so a payload only ever
/// carries parameters that were actually set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, String>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, skipping empty keys or values.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if key.is_empty() || value.is_empty() {
            return;
        }
        self.0.insert(key, value);
    }

    pub fn add_map<K, V>(&mut self, map: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in map {
            self.add(key, value);
        }
    }

    pub fn add_payload(&mut self, other: &Payload) {
        self.add_map(other.0.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    /// Serialize `json` under `encoded` (base64) or `plain`.
    pub fn add_json(&mut self, json: &serde_json::Value, base64: bool, encoded: &str, plain: &str) {
        let serialized = json.to_string();
        if base64 {
            self.add(encoded, STANDARD.encode(serialized.as_bytes()));
        } else {
            self.add(plain, serialized);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, String>> for Payload {
    fn from(map: BTreeMap<String, String>) -> Self {
        let mut payload = Self::new();
        payload.add_map(map);
        payload
    }
}

/// A queued payload together with its storage row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub id: i64,
    pub payload: Payload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_skips_empty_keys_and_values() {
        let mut payload = Payload::new();
        payload.add("", "value");
        payload.add("key", "");
        payload.add("e", "se");

        assert_eq!(payload.len(), 1);
        assert_eq!(payload.get("e"), Some("se"));
    }

    #[test]
    fn add_payload_merges_and_overrides() {
        let mut first = Payload::new();
        first.add("uid", "one");
        first.add("tz", "UTC");

        let mut second = Payload::new();
        second.add("uid", "two");

        first.add_payload(&second);
        assert_eq!(first.get("uid"), Some("two"));
        assert_eq!(first.get("tz"), Some("UTC"));
    }

    #[test]
    fn add_json_plain_and_encoded() {
        let value = json!({"schema": "iglu:x", "data": {"a": 1}});

        let mut plain = Payload::new();
        plain.add_json(&value, false, "cx", "co");
        assert_eq!(plain.get("co"), Some(value.to_string().as_str()));
        assert!(!plain.contains_key("cx"));

        let mut encoded = Payload::new();
        encoded.add_json(&value, true, "cx", "co");
        let decoded = STANDARD.decode(encoded.get("cx").unwrap()).unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn serializes_as_flat_object() {
        let mut payload = Payload::new();
        payload.add("e", "se");
        payload.add("aid", "app");

        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"aid":"app","e":"se"}"#);

        let parsed: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, payload);
    }
}
