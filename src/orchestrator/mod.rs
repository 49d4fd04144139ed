mod logs;
mod session;

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::capabilities::FileSaver;
use crate::config::LogServiceSettings;
use crate::error::{CurlhopError, Result};
use crate::interpreter::parse_curl;
use crate::request::{build_request, split_url, HeaderRules, RequestDescriptor};
use crate::response::{
    classify_response, correlation_id, elapsed_seconds, Payload, ResponseOutcome,
};
use crate::store::{
    normalize_origin, CurlHistory, KeyValueStore, ServiceRegistry, DEFAULT_HISTORY_LIMIT,
    LAST_REQUEST_ID_KEY,
};
use crate::transport::{Transport, TransportResponse};

pub use logs::{decode_logs, log_url, LogRecord, LOG_PATH_PREFIX};
pub use session::{Phase, Snapshot};

use session::Session;

const CURL_ORIGIN_KEY: &str = "curlOrigin";

/// Drives a pasted curl command from text to a classified response, and
/// fetches the server logs that belong to it.
///
/// One request may be in flight at a time. Each execution is stamped with a
/// sequence number; a result that arrives after the operator moved on is
/// dropped instead of overwriting newer state.
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    store: Arc<dyn KeyValueStore>,
    saver: Arc<dyn FileSaver>,
    header_rules: HeaderRules,
    log_service: LogServiceSettings,
    history_limit: usize,
    session: Mutex<Session>,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
        saver: Arc<dyn FileSaver>,
    ) -> Self {
        Self {
            transport,
            store,
            saver,
            header_rules: HeaderRules::default(),
            log_service: LogServiceSettings::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            session: Mutex::new(Session::default()),
        }
    }

    pub fn with_header_rules(mut self, rules: HeaderRules) -> Self {
        self.header_rules = rules;
        self
    }

    pub fn with_log_service(mut self, log_service: LogServiceSettings) -> Self {
        self.log_service = log_service;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn services(&self) -> ServiceRegistry<'_> {
        ServiceRegistry::new(self.store.as_ref())
    }

    pub fn history(&self) -> CurlHistory<'_> {
        CurlHistory::new(self.store.as_ref(), self.history_limit)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().view.clone()
    }

    /// Correlation id of the most recent response, kept across runs.
    pub fn last_request_id(&self) -> Option<String> {
        self.store
            .get(LAST_REQUEST_ID_KEY)
            .filter(|value| !value.is_empty())
    }

    /// Interprets the curl text and resolves it against the service
    /// registry without sending anything.
    ///
    /// `origin` is an explicit operator choice; it is registered and becomes
    /// the active service.
    pub fn prepare(&self, curl_text: &str, origin: Option<&str>) -> Result<RequestDescriptor> {
        let token = self.begin_build()?;
        let result = self.resolve(curl_text, origin);
        self.finish_build(&mut self.lock(), token, &result);
        result
    }

    /// Builds, sends and classifies one request.
    ///
    /// Build failures are returned as errors and nothing is sent. Transport
    /// and server failures are part of the returned outcome. `Stale` means a
    /// newer request superseded this one while it was in flight.
    pub async fn submit(&self, curl_text: &str, origin: Option<&str>) -> Result<ResponseOutcome> {
        let token = self.begin_build()?;
        let result = self.resolve(curl_text, origin);

        let (request, sequence) = {
            let mut session = self.lock();
            self.finish_build(&mut session, token, &result);
            let request = result?;
            if session.view.phase == Phase::Executing {
                return Err(CurlhopError::Busy);
            }
            let sequence = session.begin_execution(&request);
            self.remember(LAST_REQUEST_ID_KEY, "");
            (request, sequence)
        };
        info!(sequence, method = %request.method, url = %request.url, "executing request");

        let outcome = self.execute(&request).await;

        let mut session = self.lock();
        if !session.is_current(sequence) {
            debug!(sequence, "discarding result of superseded request");
            return Err(CurlhopError::Stale);
        }
        session.finish(&outcome);
        if !outcome.correlation_id().is_empty() {
            self.remember(LAST_REQUEST_ID_KEY, outcome.correlation_id());
        }
        Ok(outcome)
    }

    /// The operator moved on; any in-flight result will be discarded.
    pub fn abandon(&self) {
        self.lock().abandon();
    }

    /// Fetches the server logs for a correlation id. Success replaces the
    /// log list, any failure clears it.
    pub async fn fetch_logs(&self, correlation_id: &str) -> Result<Vec<LogRecord>> {
        let sequence = {
            let mut session = self.lock();
            session.log_sequence += 1;
            session.log_sequence
        };

        let result = self.load_logs(correlation_id).await;

        let mut session = self.lock();
        if session.log_sequence != sequence {
            debug!(sequence, "discarding superseded log fetch");
            return Err(CurlhopError::Stale);
        }
        match result {
            Ok(logs) => {
                info!(count = logs.len(), "fetched request logs");
                session.view.logs = Some(logs.clone());
                Ok(logs)
            }
            Err(err) => {
                warn!(error = %err, "log fetch failed");
                session.view.logs = None;
                Err(err)
            }
        }
    }

    fn resolve(&self, curl_text: &str, origin: Option<&str>) -> Result<RequestDescriptor> {
        let curl = parse_curl(curl_text)?;
        let url = curl.url.as_deref().ok_or(CurlhopError::UnparsableCurl)?;
        let parts = split_url(url)?;

        self.discover(&parts.origin);
        if let Some(explicit) = origin.map(normalize_origin).filter(|o| !o.is_empty()) {
            self.activate(&explicit);
        }

        let active = self.services().active();
        let request = build_request(&curl, active.as_deref())?;
        let request = self.header_rules.apply(&request);

        if let Err(err) = self.history().record(&request.label(), curl_text.trim()) {
            warn!(error = %err, "could not record curl history");
        }
        Ok(request)
    }

    /// A curl command pointing at a different origin than the previous one
    /// registers that origin and makes it the active service.
    fn discover(&self, origin: &str) {
        if self.store.get(CURL_ORIGIN_KEY).as_deref() == Some(origin) {
            return;
        }
        info!(%origin, "discovered service origin from curl command");
        self.remember(CURL_ORIGIN_KEY, origin);
        self.activate(origin);
    }

    fn activate(&self, origin: &str) {
        let registry = self.services();
        let result = registry
            .append_if_absent(origin)
            .and_then(|_| registry.set_active(Some(origin)));
        if let Err(err) = result {
            warn!(error = %err, %origin, "could not update service registry");
        }
    }

    async fn execute(&self, request: &RequestDescriptor) -> ResponseOutcome {
        match self.transport.send(request).await {
            Ok(response) => self.interpret(response),
            Err(err) => {
                warn!(error = %err, "no response received");
                ResponseOutcome::Failure {
                    message: err.to_string(),
                    status_text: None,
                    raw_body: None,
                    correlation_id: String::new(),
                    elapsed_seconds: None,
                }
            }
        }
    }

    fn interpret(&self, response: TransportResponse) -> ResponseOutcome {
        let correlation_id = correlation_id(&response.headers);
        let elapsed_seconds = elapsed_seconds(&response.headers);
        let classified = classify_response(&response.headers, &response.body);

        if !response.is_success() {
            let raw_body = classified
                .map(|classified| classified.payload.render())
                .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).into_owned());
            return ResponseOutcome::Failure {
                message: format!("Request failed with status code {}", response.status),
                status_text: Some(response.status_text),
                raw_body: Some(raw_body),
                correlation_id,
                elapsed_seconds,
            };
        }

        let classified = match classified {
            Ok(classified) => classified,
            Err(err) => {
                return ResponseOutcome::Failure {
                    message: err.to_string(),
                    status_text: Some(response.status_text),
                    raw_body: Some(String::from_utf8_lossy(&response.body).into_owned()),
                    correlation_id,
                    elapsed_seconds,
                }
            }
        };

        let payload = match classified.payload {
            Payload::Attachment(mut attachment) => {
                match self.saver.save(&attachment.filename, &attachment.bytes) {
                    Ok(path) => attachment.saved_to = Some(path),
                    Err(err) => {
                        return ResponseOutcome::Failure {
                            message: format!("Saving {} failed: {err:#}", attachment.filename),
                            status_text: Some(response.status_text),
                            raw_body: None,
                            correlation_id,
                            elapsed_seconds,
                        }
                    }
                }
                Payload::Attachment(attachment)
            }
            other => other,
        };

        ResponseOutcome::Success {
            status: response.status,
            payload,
            correlation_id: classified.correlation_id,
            elapsed_seconds: classified.elapsed_seconds,
        }
    }

    async fn load_logs(&self, correlation_id: &str) -> Result<Vec<LogRecord>> {
        let correlation_id = correlation_id.trim();
        if correlation_id.is_empty() {
            return Err(CurlhopError::LogFetch("request id is empty".to_string()));
        }
        let origin = self
            .log_service
            .origin
            .clone()
            .or_else(|| self.services().active())
            .ok_or_else(|| CurlhopError::LogFetch("no log service origin configured".to_string()))?;

        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if let Some(token) = &self.log_service.token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        let request = RequestDescriptor::get(&log_url(&origin, correlation_id), headers)
            .map_err(|err| CurlhopError::LogFetch(err.to_string()))?;

        debug!(url = %request.url, "fetching request logs");
        let response = self
            .transport
            .send(&request)
            .await
            .map_err(|err| CurlhopError::LogFetch(err.to_string()))?;
        if !response.is_success() {
            return Err(CurlhopError::LogFetch(format!(
                "log service answered {} {}",
                response.status, response.status_text
            )));
        }
        decode_logs(&response.body)
    }

    fn remember(&self, key: &str, value: &str) {
        if let Err(err) = self.store.set(key, value) {
            warn!(error = %err, key, "could not persist state");
        }
    }

    fn begin_build(&self) -> Result<u64> {
        self.lock().begin_build().ok_or(CurlhopError::Busy)
    }

    fn finish_build(
        &self,
        session: &mut Session,
        token: u64,
        result: &Result<RequestDescriptor>,
    ) {
        let owned = match result {
            Ok(request) => session.finish_build(token, Some(request), None),
            Err(err) => {
                debug!(error = %err, "cannot execute curl command");
                session.finish_build(token, None, Some(err.to_string()))
            }
        };
        if !owned {
            debug!(token, "build overtaken, leaving session untouched");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|err| err.into_inner())
    }
}
