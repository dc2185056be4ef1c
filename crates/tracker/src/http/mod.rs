//! Transport to the collector.
//!
//! The emitter talks to the collector through the [`HttpClient`] trait so a
//! different transport (or a recording double in tests) can be plugged in
//! through [`NetworkConfiguration`](crate::NetworkConfiguration).
//! [`ReqwestHttpClient`] is the default implementation.

mod request_result;
mod reqwest_client;

pub use request_result::HttpRequestResult;
pub use reqwest_client::{ReqwestHttpClient, ReqwestHttpClientBuilder};

use crate::{Error, Result};
use reqwest::Url;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// HTTP method used to send events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    Get,
    #[default]
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

impl std::str::FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            other => Err(Error::InvalidArgument(format!("unknown method: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

/// Full endpoint URL for a collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorUrl(Url);

impl CollectorUrl {
    /// Build the endpoint for `uri` (host, optional port and path prefix,
    /// no scheme) and the request method.
    pub fn new(uri: &str, protocol: Protocol, method: Method) -> Result<Self> {
        if uri.is_empty() {
            return Err(Error::InvalidArgument("collector uri is empty".into()));
        }
        let lower = uri.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Err(Error::InvalidArgument(format!(
                "collector uri must not include the protocol: {uri}"
            )));
        }

        let path = match method {
            Method::Get => crate::constants::GET_PATH,
            Method::Post => crate::constants::POST_PATH,
        };
        let raw = format!("{protocol}://{}/{path}", uri.trim_end_matches('/'));
        let url = Url::parse(&raw)
            .map_err(|e| Error::InvalidArgument(format!("invalid collector uri {uri}: {e}")))?;
        let host = url.host_str().unwrap_or_default();
        if host.is_empty() || host.split('.').any(str::is_empty) {
            return Err(Error::InvalidArgument(format!(
                "collector uri has no valid host: {uri}"
            )));
        }

        Ok(Self(url))
    }

    pub fn hostname(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> Option<u16> {
        self.0.port()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl std::fmt::Display for CollectorUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sends encoded events to the collector.
///
/// Implementations never fail: transport errors are reported through
/// [`HttpRequestResult`] as internal errors so the emitter can retry.
pub trait HttpClient: Send + Sync {
    /// `GET url?query_string` for a single event.
    fn http_get<'a>(
        &'a self,
        url: &'a CollectorUrl,
        query_string: String,
        row_ids: Vec<i64>,
        oversize: bool,
    ) -> BoxFuture<'a, HttpRequestResult>;

    /// `POST url` with a `payload_data` JSON body.
    fn http_post<'a>(
        &'a self,
        url: &'a CollectorUrl,
        post_data: String,
        row_ids: Vec<i64>,
        oversize: bool,
    ) -> BoxFuture<'a, HttpRequestResult>;
}
