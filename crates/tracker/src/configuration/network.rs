use crate::http::{HttpClient, Method, Protocol, ReqwestHttpClient};
use crate::Result;
use std::sync::Arc;

/// Collector endpoint and transport.
#[derive(Clone)]
pub struct NetworkConfiguration {
    collector_hostname: String,
    protocol: Protocol,
    method: Method,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl NetworkConfiguration {
    /// `collector_url` may carry an `http://` or `https://` prefix; without
    /// one HTTPS is used.
    pub fn new(collector_url: &str, method: Method) -> Self {
        let lower = collector_url.to_ascii_lowercase();
        let (protocol, hostname) = if lower.starts_with("http://") {
            (Protocol::Http, &collector_url["http://".len()..])
        } else if lower.starts_with("https://") {
            (Protocol::Https, &collector_url["https://".len()..])
        } else {
            (Protocol::Https, collector_url)
        };

        Self {
            collector_hostname: hostname.to_string(),
            protocol,
            method,
            http_client: None,
        }
    }

    /// Send through a custom client instead of [`ReqwestHttpClient`].
    pub fn http_client_override(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn collector_hostname(&self) -> &str {
        &self.collector_hostname
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn http_client(&self) -> Result<Arc<dyn HttpClient>> {
        match &self.http_client {
            Some(client) => Ok(Arc::clone(client)),
            None => Ok(Arc::new(ReqwestHttpClient::new()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_protocol_prefix() {
        let http = NetworkConfiguration::new("http://com.acme", Method::Get);
        assert_eq!(http.protocol(), Protocol::Http);
        assert_eq!(http.collector_hostname(), "com.acme");
        assert_eq!(http.method(), Method::Get);

        let https = NetworkConfiguration::new("https://com.acme:8080", Method::Post);
        assert_eq!(https.protocol(), Protocol::Https);
        assert_eq!(https.collector_hostname(), "com.acme:8080");
    }

    #[test]
    fn defaults_to_https() {
        let config = NetworkConfiguration::new("com.acme", Method::default());
        assert_eq!(config.protocol(), Protocol::Https);
        assert_eq!(config.method(), Method::Post);
        assert_eq!(config.collector_hostname(), "com.acme");
    }

    #[test]
    fn builds_default_client() {
        let config = NetworkConfiguration::new("com.acme", Method::Post);
        assert!(config.http_client().is_ok());
    }
}
