//! Trackable events.
//!
//! Every event type implements [`Event`]. The trait supplies the fields
//! shared by all events (custom context entities, true timestamp, an event
//! level [`Subject`]) through [`EventCommon`], and each type builds its own
//! protocol parameters in [`Event::custom_payload`].

mod screen_view;
mod self_describing;
mod structured;
mod timing;

pub use screen_view::ScreenViewEvent;
pub use self_describing::SelfDescribingEvent;
pub use structured::StructuredEvent;
pub use timing::TimingEvent;

use crate::constants::{
    EVENT, EVENT_UNSTRUCTURED, SCHEMA_UNSTRUCT_EVENT, TRUE_TIMESTAMP, UNSTRUCTURED,
    UNSTRUCTURED_ENCODED,
};
use crate::{Error, EventPayload, Result, SelfDescribingJson, Subject};

/// Fields every event carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCommon {
    pub context: Vec<SelfDescribingJson>,
    /// User-defined timestamp in milliseconds, sent as `ttm`.
    pub true_timestamp: Option<u64>,
    pub subject: Option<Subject>,
}

pub trait Event {
    fn common(&self) -> &EventCommon;

    /// Parameters specific to this event type, including `e`.
    fn custom_payload(&self, use_base64: bool) -> Result<EventPayload>;

    /// Full event payload; fails when the event type is missing.
    fn payload(&self, use_base64: bool) -> Result<EventPayload> {
        let mut payload = self.custom_payload(use_base64)?;

        if payload.get(EVENT).is_none() {
            return Err(Error::InvalidArgument("missing event type".into()));
        }
        if let Some(ttm) = self.common().true_timestamp {
            payload.add(TRUE_TIMESTAMP, ttm.to_string());
        }

        Ok(payload)
    }

    fn context(&self) -> &[SelfDescribingJson] {
        &self.common().context
    }

    fn subject(&self) -> Option<&Subject> {
        self.common().subject.as_ref()
    }
}

/// Builder methods for the shared event fields.
macro_rules! impl_common_builders {
    ($event:ty) => {
        impl $event {
            pub fn with_context(mut self, context: Vec<$crate::SelfDescribingJson>) -> Self {
                self.common.context = context;
                self
            }

            pub fn with_true_timestamp(mut self, true_timestamp: u64) -> Self {
                self.common.true_timestamp = Some(true_timestamp);
                self
            }

            pub fn with_subject(mut self, subject: $crate::Subject) -> Self {
                self.common.subject = Some(subject);
                self
            }
        }

        impl $crate::events::Event for $event {
            fn common(&self) -> &$crate::events::EventCommon {
                &self.common
            }

            fn custom_payload(&self, use_base64: bool) -> $crate::Result<$crate::EventPayload> {
                self.build_payload(use_base64)
            }
        }
    };
}
pub(crate) use impl_common_builders;

/// Wrap `event` in an `unstruct_event` envelope as `ue_px` / `ue_pr`.
pub(crate) fn self_describing_payload(event: &SelfDescribingJson, use_base64: bool) -> EventPayload {
    let mut payload = EventPayload::new();
    payload.add(EVENT, EVENT_UNSTRUCTURED);

    let envelope = SelfDescribingJson::new(SCHEMA_UNSTRUCT_EVENT, event.to_json());
    payload.add_json(
        &envelope.to_json(),
        use_base64,
        UNSTRUCTURED_ENCODED,
        UNSTRUCTURED,
    );
    payload
}
