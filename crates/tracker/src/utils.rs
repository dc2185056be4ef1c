//! Clock, id and encoding helpers.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

pub(crate) fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

pub(crate) fn uuid4() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `2021-12-08T13:45:01.123Z`
pub(crate) fn ms_to_datetime_string(ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .unwrap_or_default()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

pub(crate) fn to_query_string(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_string_has_millis_and_zulu() {
        assert_eq!(ms_to_datetime_string(1_638_971_101_123), "2021-12-08T13:45:01.123Z");
        assert_eq!(ms_to_datetime_string(0), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn query_string_is_sorted_and_encoded() {
        let mut map = BTreeMap::new();
        map.insert("se_ca".to_string(), "shop & more".to_string());
        map.insert("e".to_string(), "se".to_string());

        assert_eq!(to_query_string(&map), "e=se&se_ca=shop%20%26%20more");
        assert_eq!(to_query_string(&BTreeMap::new()), "");
    }

    #[test]
    fn uuids_are_unique_v4() {
        let a = uuid4();
        let b = uuid4();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
        assert_eq!(&a[14..15], "4");
    }
}
