use std::collections::HashMap;

const NO_RETRY_STATUS_CODES: [i32; 5] = [400, 401, 403, 410, 422];

/// Outcome of one request to the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequestResult {
    status_code: i32,
    row_ids: Vec<i64>,
    internal_error: bool,
    oversize: bool,
}

impl HttpRequestResult {
    /// `internal_error` marks requests that never got a response; their
    /// status code is reported as -1.
    pub fn new(internal_error: bool, status_code: i32, row_ids: Vec<i64>, oversize: bool) -> Self {
        Self {
            status_code: if internal_error { -1 } else { status_code },
            row_ids,
            internal_error,
            oversize,
        }
    }

    pub fn status_code(&self) -> i32 {
        self.status_code
    }

    pub fn row_ids(&self) -> &[i64] {
        &self.row_ids
    }

    pub fn is_oversize(&self) -> bool {
        self.oversize
    }

    pub fn is_success(&self) -> bool {
        !self.internal_error && (200..300).contains(&self.status_code)
    }

    /// Whether the events should stay queued for another attempt.
    ///
    /// Oversized requests are never retried. Custom rules take precedence
    /// over the default no-retry list.
    pub fn should_retry(&self, custom_retry: &HashMap<u16, bool>) -> bool {
        if self.is_success() || self.oversize {
            return false;
        }
        if self.internal_error {
            return true;
        }
        if let Some(retry) = u16::try_from(self.status_code)
            .ok()
            .and_then(|code| custom_retry.get(&code))
        {
            return *retry;
        }
        !NO_RETRY_STATUS_CODES.contains(&self.status_code)
    }
}

impl Default for HttpRequestResult {
    fn default() -> Self {
        Self::new(false, 0, Vec::new(), false)
    }
}
