//! Recording HTTP client for tests.

use crate::http::{BoxFuture, CollectorUrl, HttpClient, HttpRequestResult, Method};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub url: String,
    /// Query string for GET, JSON body for POST.
    pub body: String,
    pub row_ids: Vec<i64>,
    pub oversize: bool,
}

impl RecordedRequest {
    /// Events carried by a POST body.
    pub fn posted_events(&self) -> Vec<serde_json::Value> {
        let body: serde_json::Value = serde_json::from_str(&self.body).unwrap();
        body["data"].as_array().cloned().unwrap_or_default()
    }
}

#[derive(Debug)]
struct Responses {
    code: i32,
    temporary: Option<(i32, usize)>,
}

/// Answers every request with a configurable status code and records it.
#[derive(Debug)]
pub(crate) struct TestHttpClient {
    requests: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<Responses>,
}

impl TestHttpClient {
    pub fn new() -> Self {
        Self::with_response_code(200)
    }

    pub fn with_response_code(code: i32) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(Responses {
                code,
                temporary: None,
            }),
        }
    }

    pub fn set_response_code(&self, code: i32) {
        self.responses.lock().unwrap().code = code;
    }

    /// Answer the next `count` requests with `code`.
    pub fn set_temporary_response_code(&self, code: i32, count: usize) {
        self.responses.lock().unwrap().temporary = Some((code, count));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn respond(&self, request: RecordedRequest) -> HttpRequestResult {
        let code = {
            let mut responses = self.responses.lock().unwrap();
            match responses.temporary.take() {
                Some((code, remaining)) if remaining > 0 => {
                    if remaining > 1 {
                        responses.temporary = Some((code, remaining - 1));
                    }
                    code
                }
                _ => responses.code,
            }
        };
        let result = HttpRequestResult::new(false, code, request.row_ids.clone(), request.oversize);
        self.requests.lock().unwrap().push(request);
        result
    }
}

impl HttpClient for TestHttpClient {
    fn http_get<'a>(
        &'a self,
        url: &'a CollectorUrl,
        query_string: String,
        row_ids: Vec<i64>,
        oversize: bool,
    ) -> BoxFuture<'a, HttpRequestResult> {
        Box::pin(async move {
            self.respond(RecordedRequest {
                method: Method::Get,
                url: url.to_string(),
                body: query_string,
                row_ids,
                oversize,
            })
        })
    }

    fn http_post<'a>(
        &'a self,
        url: &'a CollectorUrl,
        post_data: String,
        row_ids: Vec<i64>,
        oversize: bool,
    ) -> BoxFuture<'a, HttpRequestResult> {
        Box::pin(async move {
            self.respond(RecordedRequest {
                method: Method::Post,
                url: url.to_string(),
                body: post_data,
                row_ids,
                oversize,
            })
        })
    }
}
