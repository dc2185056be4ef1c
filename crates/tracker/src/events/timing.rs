use super::{EventCommon, impl_common_builders, self_describing_payload};
use crate::constants::{SCHEMA_USER_TIMINGS, UT_CATEGORY, UT_LABEL, UT_TIMING, UT_VARIABLE};
use crate::{Error, EventPayload, Result, SelfDescribingJson};
use serde_json::{Map, Value};

/// A user timing measurement in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingEvent {
    pub category: String,
    pub variable: String,
    pub timing: u64,
    pub label: Option<String>,
    common: EventCommon,
}

impl TimingEvent {
    pub fn new(category: impl Into<String>, variable: impl Into<String>, timing: u64) -> Self {
        Self {
            category: category.into(),
            variable: variable.into(),
            timing,
            label: None,
            common: EventCommon::default(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn build_payload(&self, use_base64: bool) -> Result<EventPayload> {
        if self.category.is_empty() {
            return Err(Error::InvalidArgument("category is required".into()));
        }
        if self.variable.is_empty() {
            return Err(Error::InvalidArgument("variable is required".into()));
        }

        let mut data = Map::new();
        data.insert(UT_CATEGORY.into(), Value::String(self.category.clone()));
        data.insert(UT_VARIABLE.into(), Value::String(self.variable.clone()));
        data.insert(UT_TIMING.into(), Value::from(self.timing));
        if let Some(label) = &self.label {
            data.insert(UT_LABEL.into(), Value::String(label.clone()));
        }

        let event = SelfDescribingJson::new(SCHEMA_USER_TIMINGS, Value::Object(data));
        Ok(self_describing_payload(&event, use_base64))
    }
}

impl_common_builders!(TimingEvent);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use serde_json::json;

    #[test]
    fn category_and_variable_are_required() {
        assert!(TimingEvent::new("", "load", 10).payload(false).is_err());
        assert!(TimingEvent::new("page", "", 10).payload(false).is_err());
    }

    #[test]
    fn builds_timing_data() {
        let event = TimingEvent::new("page", "load", 123).label("cold");
        let payload = event.payload(false).unwrap();
        let ue: Value = serde_json::from_str(payload.get("ue_pr").unwrap()).unwrap();

        assert_eq!(payload.get("e"), Some("ue"));
        assert_eq!(ue["data"]["schema"], SCHEMA_USER_TIMINGS);
        assert_eq!(
            ue["data"]["data"],
            json!({"category": "page", "variable": "load", "timing": 123, "label": "cold"})
        );
    }

    #[test]
    fn label_is_optional() {
        let payload = TimingEvent::new("page", "load", 5).payload(false).unwrap();
        let ue: Value = serde_json::from_str(payload.get("ue_pr").unwrap()).unwrap();
        assert!(ue["data"]["data"].get("label").is_none());
    }
}
