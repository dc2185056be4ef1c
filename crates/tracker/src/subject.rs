//! The user and device an event is about.

use crate::constants::{
    COLOR_DEPTH, IP_ADDRESS, LANGUAGE, RESOLUTION, TIMEZONE, UID, USERAGENT, VIEWPORT,
};
use storage::Payload;

/// Subject parameters attached to events.
///
/// A subject set on the tracker applies to every event; a subject set on an
/// event overrides the tracker's values for that event only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subject {
    payload: Payload,
}

impl Subject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user_id(&mut self, user_id: &str) {
        self.payload.add(UID, user_id);
    }

    pub fn set_screen_resolution(&mut self, width: u32, height: u32) {
        self.payload.add(RESOLUTION, format!("{width}x{height}"));
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.payload.add(VIEWPORT, format!("{width}x{height}"));
    }

    pub fn set_color_depth(&mut self, depth: u32) {
        self.payload.add(COLOR_DEPTH, depth.to_string());
    }

    pub fn set_timezone(&mut self, timezone: &str) {
        self.payload.add(TIMEZONE, timezone);
    }

    pub fn set_language(&mut self, language: &str) {
        self.payload.add(LANGUAGE, language);
    }

    pub fn set_useragent(&mut self, useragent: &str) {
        self.payload.add(USERAGENT, useragent);
    }

    pub fn set_ip_address(&mut self, ip_address: &str) {
        self.payload.add(IP_ADDRESS, ip_address);
    }

    pub fn get_map(&self) -> &Payload {
        &self.payload
    }
}
