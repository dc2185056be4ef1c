//! Background delivery of queued events.
//!
//! The [`Emitter`] owns a tokio task that drains the [`EventStore`] in
//! batches, sends them to the collector, and deletes what was delivered (or
//! can never be delivered). Failed sends that may succeed later stay queued
//! and the loop backs off with a [`RetryDelay`].

mod emit_status;
mod retry_delay;

pub use emit_status::{EmitCallback, EmitStatus};
pub use retry_delay::RetryDelay;

use crate::constants::{SCHEMA_PAYLOAD_DATA, SENT_TIMESTAMP};
use crate::http::{CollectorUrl, HttpClient, HttpRequestResult, Method};
use crate::{EmitterConfiguration, Error, NetworkConfiguration, Result, SelfDescribingJson, utils};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use storage::{EventRow, EventStore, Payload};
use tokio::sync::Notify;
use tokio::task::{JoinHandle, JoinSet};

/// `{"schema":"iglu:com.snowplowanalytics.snowplow/payload_data/jsonschema/1-0-4","data":[]}`
const POST_WRAPPER_BYTES: usize = 88;
/// `"stm":"1443452851000",`
const POST_STM_BYTES: usize = 22;
/// How long an idle loop sleeps before polling the store again.
const IDLE_WAIT: Duration = Duration::from_secs(5);

/// Sends queued events to a collector from a background task.
pub struct Emitter {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    url: CollectorUrl,
    method: Method,
    batch_size: usize,
    byte_limit_get: usize,
    byte_limit_post: usize,
    store: Arc<dyn EventStore>,
    client: Arc<dyn HttpClient>,
    callback: RwLock<Option<(EmitCallback, HashSet<EmitStatus>)>>,
    custom_retry: RwLock<HashMap<u16, bool>>,
    running: AtomicBool,
    wake: Notify,
    drained: Notify,
}

/// Event ids grouped by what happened to them in one round.
#[derive(Debug, Default)]
struct RoundOutcome {
    succeeded: Vec<String>,
    will_retry: Vec<String>,
    wont_retry: Vec<String>,
    delete_ids: Vec<i64>,
    any_retry: bool,
}

impl Emitter {
    /// Create an emitter. It does not send anything until [`start`](Self::start).
    pub fn new(network: &NetworkConfiguration, config: &EmitterConfiguration) -> Result<Self> {
        let url = CollectorUrl::new(network.collector_hostname(), network.protocol(), network.method())?;

        let emitter = Self {
            inner: Arc::new(Inner {
                url,
                method: network.method(),
                batch_size: config.get_batch_size().max(1),
                byte_limit_get: config.get_byte_limit_get(),
                byte_limit_post: config.get_byte_limit_post(),
                store: config.event_store()?,
                client: network.http_client()?,
                callback: RwLock::new(None),
                custom_retry: RwLock::new(HashMap::new()),
                running: AtomicBool::new(false),
                wake: Notify::new(),
                drained: Notify::new(),
            }),
            worker: Mutex::new(None),
        };

        if let Some((callback, statuses)) = config.get_request_callback() {
            emitter.set_request_callback(callback.clone(), statuses)?;
        }
        for (&code, &retry) in config.get_custom_retry_for_status_codes() {
            emitter.set_custom_retry_for_status_code(code, retry)?;
        }

        Ok(emitter)
    }

    /// Spawn the send loop on the current tokio runtime. Does nothing if
    /// the loop is already running.
    pub fn start(&self) -> Result<()> {
        let mut worker = self
            .worker
            .lock()
            .map_err(|_| Error::InvalidState("emitter worker lock poisoned".into()))?;
        if self.inner.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        let handle = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
        self.inner.running.store(true, Ordering::SeqCst);
        *worker = Some(handle.spawn(run(Arc::clone(&self.inner))));
        tracing::info!(url = %self.inner.url, method = %self.inner.method, "emitter started");
        Ok(())
    }

    /// Stop the send loop and wait for the current round to finish.
    pub async fn stop(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.wake.notify_one();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| {
                tracing::warn!("emitter worker lock poisoned");
                PoisonError::into_inner(poisoned)
            })
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "emitter task ended abnormally");
            }
            tracing::info!("emitter stopped");
        }
        self.inner.drained.notify_waiters();
    }

    /// Send everything currently queued, then stop.
    pub async fn flush(&self) -> Result<()> {
        self.start()?;

        let drained = self.inner.drained.notified();
        tokio::pin!(drained);
        drained.as_mut().enable();
        self.inner.wake.notify_one();
        drained.await;

        self.stop().await;
        Ok(())
    }

    /// Queue a payload and wake the send loop.
    pub fn add(&self, payload: Payload) -> Result<()> {
        self.inner.store.add_event(&payload)?;
        self.inner.wake.notify_one();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Register a callback for the given delivery statuses.
    pub fn set_request_callback(&self, callback: EmitCallback, statuses: &[EmitStatus]) -> Result<()> {
        self.ensure_stopped()?;
        let mut slot = self
            .inner
            .callback
            .write()
            .map_err(|_| Error::InvalidState("callback lock poisoned".into()))?;
        *slot = Some((callback, statuses.iter().copied().collect()));
        Ok(())
    }

    /// Override whether failures with `status_code` are retried.
    pub fn set_custom_retry_for_status_code(&self, status_code: u16, retry: bool) -> Result<()> {
        if status_code < 300 {
            return Err(Error::InvalidArgument(format!(
                "retry rules apply to status codes >= 300, got {status_code}"
            )));
        }
        self.ensure_stopped()?;
        self.inner
            .custom_retry
            .write()
            .map_err(|_| Error::InvalidState("retry rules lock poisoned".into()))?
            .insert(status_code, retry);
        Ok(())
    }

    pub fn url(&self) -> &CollectorUrl {
        &self.inner.url
    }

    pub fn method(&self) -> Method {
        self.inner.method
    }

    pub fn batch_size(&self) -> usize {
        self.inner.batch_size
    }

    pub fn byte_limit_get(&self) -> usize {
        self.inner.byte_limit_get
    }

    pub fn byte_limit_post(&self) -> usize {
        self.inner.byte_limit_post
    }

    pub fn event_store(&self) -> Arc<dyn EventStore> {
        Arc::clone(&self.inner.store)
    }

    fn ensure_stopped(&self) -> Result<()> {
        if self.is_running() {
            return Err(Error::InvalidState(
                "emitter must be stopped to change its configuration".into(),
            ));
        }
        Ok(())
    }
}

impl Drop for Emitter {
    fn drop(&mut self) {
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.wake.notify_one();
    }
}

async fn run(inner: Arc<Inner>) {
    let mut retry_delay = RetryDelay::default();

    while inner.running.load(Ordering::SeqCst) {
        let rows = match inner.store.get_event_rows_batch(inner.batch_size) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read queued events");
                Vec::new()
            }
        };

        if rows.is_empty() {
            inner.drained.notify_waiters();
            let _ = tokio::time::timeout(IDLE_WAIT, inner.wake.notified()).await;
            continue;
        }

        let (results, failed_tasks) = inner.send(&rows).await;
        let mut outcome = inner.classify(&rows, &results);
        outcome.any_retry |= failed_tasks > 0;
        tracing::debug!(
            requests = results.len(),
            succeeded = outcome.succeeded.len(),
            will_retry = outcome.will_retry.len(),
            wont_retry = outcome.wont_retry.len(),
            "sent batch"
        );

        inner.notify_callback(&outcome);
        if let Err(e) = inner.store.delete_event_rows_with_ids(&outcome.delete_ids) {
            tracing::warn!(error = %e, "failed to delete sent events");
        }

        if outcome.any_retry {
            retry_delay.will_retry();
        } else {
            retry_delay.wont_retry();
        }
        let delay = retry_delay.delay();
        if !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis() as u64, "backing off before next send");
            inner.back_off(delay).await;
        }
    }
}

impl Inner {
    /// Sleep for `delay`, returning early only when the loop is stopped.
    async fn back_off(&self, delay: Duration) {
        let deadline = tokio::time::Instant::now() + delay;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return,
                _ = self.wake.notified() => {
                    if !self.running.load(Ordering::SeqCst) {
                        return;
                    }
                }
            }
        }
    }

    /// Results of the requests that completed, and how many send tasks
    /// failed before producing one. Rows of a failed task stay queued.
    async fn send(&self, rows: &[EventRow]) -> (Vec<HttpRequestResult>, usize) {
        let mut requests = JoinSet::new();

        match self.method {
            Method::Get => {
                for row in rows {
                    let mut payload = row.payload.clone();
                    payload.add(SENT_TIMESTAMP, utils::now_ms().to_string());
                    let query_string = utils::to_query_string(payload.as_map());
                    let oversize = query_string.len() > self.byte_limit_get;

                    let client = Arc::clone(&self.client);
                    let url = self.url.clone();
                    let row_ids = vec![row.id];
                    requests.spawn(async move {
                        client.http_get(&url, query_string, row_ids, oversize).await
                    });
                }
            }
            Method::Post => {
                for (payloads, row_ids, oversize) in group_for_post(rows, self.byte_limit_post) {
                    let post_data = build_post_data(payloads);
                    let client = Arc::clone(&self.client);
                    let url = self.url.clone();
                    requests.spawn(async move {
                        client.http_post(&url, post_data, row_ids, oversize).await
                    });
                }
            }
        }

        let mut results = Vec::with_capacity(requests.len());
        let mut failed = 0;
        while let Some(joined) = requests.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!(error = %e, "send task failed");
                    failed += 1;
                }
            }
        }
        (results, failed)
    }

    fn classify(&self, rows: &[EventRow], results: &[HttpRequestResult]) -> RoundOutcome {
        let event_ids: HashMap<i64, &str> = rows
            .iter()
            .filter_map(|row| row.payload.get(crate::constants::EID).map(|eid| (row.id, eid)))
            .collect();
        let custom_retry = self
            .custom_retry
            .read()
            .map(|rules| rules.clone())
            .unwrap_or_default();

        let mut outcome = RoundOutcome::default();
        for result in results {
            let ids = result
                .row_ids()
                .iter()
                .filter_map(|id| event_ids.get(id).map(|eid| eid.to_string()));

            if result.is_success() {
                outcome.succeeded.extend(ids);
                outcome.delete_ids.extend_from_slice(result.row_ids());
            } else if result.should_retry(&custom_retry) {
                outcome.any_retry = true;
                outcome.will_retry.extend(ids);
            } else {
                outcome.wont_retry.extend(ids);
                outcome.delete_ids.extend_from_slice(result.row_ids());
            }
        }
        outcome
    }

    fn notify_callback(&self, outcome: &RoundOutcome) {
        let Ok(slot) = self.callback.read() else {
            return;
        };
        let Some((callback, statuses)) = slot.as_ref() else {
            return;
        };

        for (ids, status) in [
            (&outcome.succeeded, EmitStatus::Success),
            (&outcome.will_retry, EmitStatus::FailedWillRetry),
            (&outcome.wont_retry, EmitStatus::FailedWontRetry),
        ] {
            if !ids.is_empty() && statuses.contains(&status) {
                callback(ids.clone(), status);
            }
        }
    }
}

/// Split rows into POST requests that stay under `byte_limit`.
///
/// A row that alone exceeds the limit is sent by itself and flagged
/// oversize.
fn group_for_post(rows: &[EventRow], byte_limit: usize) -> Vec<(Vec<Payload>, Vec<i64>, bool)> {
    let mut groups = Vec::new();
    let mut payloads = Vec::new();
    let mut row_ids = Vec::new();
    let mut total_bytes = 0;

    for row in rows {
        let bytes = serde_json::to_string(&row.payload)
            .map(|s| s.len())
            .unwrap_or_default()
            + POST_STM_BYTES;

        if bytes + POST_WRAPPER_BYTES > byte_limit {
            groups.push((vec![row.payload.clone()], vec![row.id], true));
        } else if total_bytes + bytes + POST_WRAPPER_BYTES + payloads.len() > byte_limit {
            groups.push((
                std::mem::take(&mut payloads),
                std::mem::take(&mut row_ids),
                false,
            ));
            payloads.push(row.payload.clone());
            row_ids.push(row.id);
            total_bytes = bytes;
        } else {
            payloads.push(row.payload.clone());
            row_ids.push(row.id);
            total_bytes += bytes;
        }
    }

    if !payloads.is_empty() {
        groups.push((payloads, row_ids, false));
    }
    groups
}

/// `payload_data` envelope with the same `stm` on every event.
fn build_post_data(payloads: Vec<Payload>) -> String {
    let stm = utils::now_ms().to_string();
    let data = payloads
        .into_iter()
        .map(|mut payload| {
            payload.add(SENT_TIMESTAMP, stm.as_str());
            serde_json::to_value(payload).unwrap_or_default()
        })
        .collect();

    SelfDescribingJson::new(SCHEMA_PAYLOAD_DATA, serde_json::Value::Array(data)).to_string()
}
