use super::{EventCommon, impl_common_builders, self_describing_payload};
use crate::{EventPayload, Result, SelfDescribingJson};

/// An event described by a custom Iglu schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfDescribingEvent {
    pub event: SelfDescribingJson,
    common: EventCommon,
}

impl SelfDescribingEvent {
    pub fn new(event: SelfDescribingJson) -> Self {
        Self {
            event,
            common: EventCommon::default(),
        }
    }

    fn build_payload(&self, use_base64: bool) -> Result<EventPayload> {
        Ok(self_describing_payload(&self.event, use_base64))
    }
}

impl_common_builders!(SelfDescribingEvent);
