/// Identity of a tracker and what it adds to every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfiguration {
    namespace: String,
    app_id: String,
    platform: String,
    use_base64: bool,
    desktop_context: bool,
}

impl TrackerConfiguration {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            app_id: String::new(),
            platform: "srv".to_string(),
            use_base64: true,
            desktop_context: true,
        }
    }

    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Platform code sent as `p` (`srv`, `pc`, `app`, ...).
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Base64-encode contexts and self-describing events.
    pub fn use_base64(mut self, use_base64: bool) -> Self {
        self.use_base64 = use_base64;
        self
    }

    /// Attach the desktop context entity to every event.
    pub fn desktop_context(mut self, desktop_context: bool) -> Self {
        self.desktop_context = desktop_context;
        self
    }

    pub fn get_namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get_app_id(&self) -> &str {
        &self.app_id
    }

    pub fn get_platform(&self) -> &str {
        &self.platform
    }

    pub fn get_use_base64(&self) -> bool {
        self.use_base64
    }

    pub fn get_desktop_context(&self) -> bool {
        self.desktop_context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TrackerConfiguration::new("ns");
        assert_eq!(config.get_namespace(), "ns");
        assert_eq!(config.get_app_id(), "");
        assert_eq!(config.get_platform(), "srv");
        assert!(config.get_use_base64());
        assert!(config.get_desktop_context());
    }

    #[test]
    fn overrides() {
        let config = TrackerConfiguration::new("ns")
            .app_id("app")
            .platform("pc")
            .use_base64(false)
            .desktop_context(false);

        assert_eq!(config.get_app_id(), "app");
        assert_eq!(config.get_platform(), "pc");
        assert!(!config.get_use_base64());
        assert!(!config.get_desktop_context());
    }
}
