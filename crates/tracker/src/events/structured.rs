use super::{EventCommon, impl_common_builders};
use crate::constants::{
    EVENT, EVENT_STRUCTURED, SE_ACTION, SE_CATEGORY, SE_LABEL, SE_PROPERTY, SE_VALUE,
};
use crate::{Error, EventPayload, Result};

/// A classic Google Analytics style event: category, action and optional
/// label, property and value.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredEvent {
    pub category: String,
    pub action: String,
    pub label: Option<String>,
    pub property: Option<String>,
    pub value: Option<f64>,
    common: EventCommon,
}

impl StructuredEvent {
    pub fn new(category: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            label: None,
            property: None,
            value: None,
            common: EventCommon::default(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    fn build_payload(&self, _use_base64: bool) -> Result<EventPayload> {
        if self.category.is_empty() {
            return Err(Error::InvalidArgument("category is required".into()));
        }
        if self.action.is_empty() {
            return Err(Error::InvalidArgument("action is required".into()));
        }

        let mut payload = EventPayload::new();
        payload.add(EVENT, EVENT_STRUCTURED);
        payload.add(SE_CATEGORY, self.category.as_str());
        payload.add(SE_ACTION, self.action.as_str());
        if let Some(label) = &self.label {
            payload.add(SE_LABEL, label.as_str());
        }
        if let Some(property) = &self.property {
            payload.add(SE_PROPERTY, property.as_str());
        }
        if let Some(value) = self.value {
            payload.add(SE_VALUE, format!("{value:.6}"));
        }

        Ok(payload)
    }
}

impl_common_builders!(StructuredEvent);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;

    #[test]
    fn category_and_action_are_required() {
        assert!(StructuredEvent::new("", "action").payload(false).is_err());
        assert!(StructuredEvent::new("category", "").payload(false).is_err());
    }

    #[test]
    fn builds_structured_payload() {
        let event = StructuredEvent::new("hello", "world")
            .label("label")
            .property("property")
            .value(11.11);

        let payload = event.payload(false).unwrap();
        assert_eq!(payload.get("e"), Some("se"));
        assert_eq!(payload.get("se_ca"), Some("hello"));
        assert_eq!(payload.get("se_ac"), Some("world"));
        assert_eq!(payload.get("se_la"), Some("label"));
        assert_eq!(payload.get("se_pr"), Some("property"));
        assert_eq!(payload.get("se_va"), Some("11.110000"));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let payload = StructuredEvent::new("c", "a").payload(true).unwrap();
        for key in ["se_la", "se_pr", "se_va", "ttm"] {
            assert_eq!(payload.get(key), None, "{key} should be absent");
        }
    }
}
