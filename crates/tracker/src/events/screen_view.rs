use super::{EventCommon, impl_common_builders, self_describing_payload};
use crate::constants::{SCHEMA_SCREEN_VIEW, SV_ID, SV_NAME};
use crate::{Error, EventPayload, Result, SelfDescribingJson};
use serde_json::{Map, Value};

/// A screen (or page) shown to the user. Needs a name, an id, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenViewEvent {
    pub name: Option<String>,
    pub id: Option<String>,
    common: EventCommon,
}

impl ScreenViewEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    fn build_payload(&self, use_base64: bool) -> Result<EventPayload> {
        if self.name.is_none() && self.id.is_none() {
            return Err(Error::InvalidArgument(
                "either name or id must be set".into(),
            ));
        }

        let mut data = Map::new();
        if let Some(id) = &self.id {
            data.insert(SV_ID.into(), Value::String(id.clone()));
        }
        if let Some(name) = &self.name {
            data.insert(SV_NAME.into(), Value::String(name.clone()));
        }

        let event = SelfDescribingJson::new(SCHEMA_SCREEN_VIEW, Value::Object(data));
        Ok(self_describing_payload(&event, use_base64))
    }
}

impl_common_builders!(ScreenViewEvent);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use serde_json::json;

    fn unstruct(event: &ScreenViewEvent) -> Value {
        let payload = event.payload(false).unwrap();
        serde_json::from_str(payload.get("ue_pr").unwrap()).unwrap()
    }

    #[test]
    fn name_or_id_is_required() {
        assert!(ScreenViewEvent::new().payload(false).is_err());
        assert!(ScreenViewEvent::new().name("home").payload(false).is_ok());
        assert!(ScreenViewEvent::new().id("1").payload(false).is_ok());
    }

    #[test]
    fn wraps_screen_view_schema() {
        let event = ScreenViewEvent::new().name("home").id("screen-1");
        let ue = unstruct(&event);

        assert_eq!(ue["data"]["schema"], SCHEMA_SCREEN_VIEW);
        assert_eq!(ue["data"]["data"], json!({"name": "home", "id": "screen-1"}));
    }

    #[test]
    fn only_set_fields_appear() {
        let ue = unstruct(&ScreenViewEvent::new().name("settings"));
        assert_eq!(ue["data"]["data"], json!({"name": "settings"}));
    }
}
