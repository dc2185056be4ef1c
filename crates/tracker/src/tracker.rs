//! The tracker: turns events into payloads and hands them to the emitter.

use crate::constants::{
    APP_ID, CONTEXT, CONTEXT_ENCODED, NAMESPACE, PLATFORM, SCHEMA_CONTEXTS, TRACKER_VERSION,
    TRACKER_VERSION_LABEL,
};
use crate::{
    ClientSession, Emitter, Error, Event, Result, SelfDescribingJson, Subject,
    TrackerConfiguration, desktop,
};
use serde_json::Value;
use std::sync::RwLock;

/// Tracks events for one namespace.
///
/// Creating a tracker starts its emitter; dropping it signals the emitter
/// to stop.
pub struct Tracker {
    config: TrackerConfiguration,
    emitter: Emitter,
    subject: RwLock<Option<Subject>>,
    session: Option<ClientSession>,
}

impl Tracker {
    /// Create a tracker and start its emitter. Must be called within a
    /// tokio runtime.
    pub fn new(
        config: TrackerConfiguration,
        emitter: Emitter,
        subject: Option<Subject>,
        session: Option<ClientSession>,
    ) -> Result<Self> {
        emitter.start()?;
        Ok(Self {
            config,
            emitter,
            subject: RwLock::new(subject),
            session,
        })
    }

    /// Track an event, returning its event id.
    pub fn track(&self, event: &impl Event) -> Result<String> {
        let use_base64 = self.config.get_use_base64();
        let mut payload = event.payload(use_base64)?;
        let mut context: Vec<SelfDescribingJson> = event.context().to_vec();

        payload.add(TRACKER_VERSION, TRACKER_VERSION_LABEL);
        payload.add(PLATFORM, self.config.get_platform());
        payload.add(APP_ID, self.config.get_app_id());
        payload.add(NAMESPACE, self.config.get_namespace());

        if let Some(subject) = self.subject()?.as_ref() {
            payload.add_payload(subject.get_map());
        }
        if let Some(subject) = event.subject() {
            payload.add_payload(subject.get_map());
        }

        if let Some(session) = &self.session {
            context.push(session.update_and_get_session_context(payload.event_id(), payload.timestamp())?);
        }
        if self.config.get_desktop_context() {
            context.push(desktop::desktop_context());
        }

        if !context.is_empty() {
            let entities = context.iter().map(SelfDescribingJson::to_json).collect();
            let contexts = SelfDescribingJson::new(SCHEMA_CONTEXTS, Value::Array(entities));
            payload.add_json(&contexts.to_json(), use_base64, CONTEXT_ENCODED, CONTEXT);
        }

        let event_id = payload.event_id().to_string();
        self.emitter.add(payload.into_payload())?;
        Ok(event_id)
    }

    /// Replace the subject attached to every event.
    pub fn set_subject(&self, subject: Option<Subject>) -> Result<()> {
        *self
            .subject
            .write()
            .map_err(|_| Error::InvalidState("subject lock poisoned".into()))? = subject;
        Ok(())
    }

    pub fn start(&self) -> Result<()> {
        self.emitter.start()
    }

    pub async fn stop(&self) {
        self.emitter.stop().await;
    }

    /// Send all queued events and stop the emitter.
    pub async fn flush(&self) -> Result<()> {
        self.emitter.flush().await
    }

    pub fn namespace(&self) -> &str {
        self.config.get_namespace()
    }

    pub fn configuration(&self) -> &TrackerConfiguration {
        &self.config
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn client_session(&self) -> Option<&ClientSession> {
        self.session.as_ref()
    }

    fn subject(&self) -> Result<std::sync::RwLockReadGuard<'_, Option<Subject>>> {
        self.subject
            .read()
            .map_err(|_| Error::InvalidState("subject lock poisoned".into()))
    }
}
