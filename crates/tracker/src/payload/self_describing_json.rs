use crate::constants::{DATA, SCHEMA};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON data paired with the Iglu schema that describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfDescribingJson {
    schema: String,
    data: Value,
}

impl SelfDescribingJson {
    pub fn new(schema: impl Into<String>, data: Value) -> Self {
        Self {
            schema: schema.into(),
            data,
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// `{"schema": ..., "data": ...}`
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(SCHEMA.to_string(), Value::String(self.schema.clone()));
        map.insert(DATA.to_string(), self.data.clone());
        Value::Object(map)
    }
}

impl std::fmt::Display for SelfDescribingJson {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wraps_schema_and_data() {
        let sdj = SelfDescribingJson::new("iglu:com.acme/event/jsonschema/1-0-0", json!({"a": 1}));

        assert_eq!(
            sdj.to_json(),
            json!({"schema": "iglu:com.acme/event/jsonschema/1-0-0", "data": {"a": 1}})
        );
        let reparsed: Value = serde_json::from_str(&sdj.to_string()).unwrap();
        assert_eq!(reparsed, sdj.to_json());
    }

    #[test]
    fn nests_inside_another() {
        let inner = SelfDescribingJson::new("iglu:inner", json!({"x": true}));
        let outer = SelfDescribingJson::new("iglu:outer", inner.to_json());

        assert_eq!(outer.data()["schema"], "iglu:inner");
        assert_eq!(outer.data()["data"]["x"], true);
    }
}
