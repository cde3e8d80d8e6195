use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::Level;
#[cfg(not(target_arch = "wasm32"))]
use url::Url;

use crate::correlation::{CorrelationId, CorrelationIdGenerator};
use crate::error::TransportError;
#[cfg(not(target_arch = "wasm32"))]
use crate::http::Method;
use crate::http::{HttpRequest, HttpResponse, Transport};

const RULE: &str = " - - - - - - - - - - ";

/// Destination for formatted request/response records.
///
/// Implementations must not panic. A panicking `emit` loses that record
/// but never reaches the call being logged.
pub trait LogSink: Send + Sync {
    fn emit(&self, level: Level, target: &str, record: &str);
}

/// Forwards records to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn emit(&self, level: Level, target: &str, record: &str) {
        log::log!(target: target, level, "{record}");
    }
}

/// Forwards each record to a remote collector as a JSON string in a `PUT`
/// body.
///
/// Delivery is fire-and-forget: the request runs on a task spawned on the
/// current tokio runtime, and failures are only reported through `warn!`.
/// Records emitted outside a runtime are dropped.
#[cfg(not(target_arch = "wasm32"))]
pub struct HttpLogSink<T> {
    transport: Arc<T>,
    url: Url,
}

#[cfg(not(target_arch = "wasm32"))]
impl<T> HttpLogSink<T> {
    pub fn new(transport: T, url: Url) -> Self {
        Self::from_shared(Arc::new(transport), url)
    }

    pub fn from_shared(transport: Arc<T>, url: Url) -> Self {
        Self { transport, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn request(&self, record: &str) -> serde_json::Result<HttpRequest> {
        Ok(HttpRequest::new(Method::Put, self.url.clone())
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .body(serde_json::to_vec(record)?))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl<T> LogSink for HttpLogSink<T>
where
    T: Transport + Send + Sync + 'static,
{
    fn emit(&self, _level: Level, _target: &str, record: &str) {
        let request = match self.request(record) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("could not encode log record: {e}");
                return;
            }
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("no async runtime, log record for {} dropped", self.url);
            return;
        };

        let transport = Arc::clone(&self.transport);
        runtime.spawn(async move {
            match transport.send(&request).await {
                Ok(response) if !response.is_success() => {
                    log::warn!("log forwarding to {} got HTTP {}", request.url, response.status);
                }
                Ok(_) => {}
                Err(e) => log::warn!("log forwarding to {} failed: {e}", request.url),
            }
        });
    }
}

/// Renders the request and response/error halves of a network log record.
/// Both halves carry the same correlation ID.
#[derive(Debug, Clone)]
pub struct RequestLogFormatter {
    ids: Arc<CorrelationIdGenerator>,
}

impl RequestLogFormatter {
    pub fn new(ids: Arc<CorrelationIdGenerator>) -> Self {
        Self { ids }
    }

    /// Issue a new ID for `request` and render the request section.
    pub fn format_request(&self, request: &HttpRequest) -> (CorrelationId, String) {
        let id = self.ids.next();
        (id, render_request(id, request, Utc::now()))
    }

    pub fn format_response(
        &self,
        id: CorrelationId,
        outcome: Result<&HttpResponse, &TransportError>,
        elapsed: Duration,
    ) -> String {
        render_outcome(id, outcome, elapsed)
    }
}

pub fn render_request(id: CorrelationId, request: &HttpRequest, sent_at: DateTime<Utc>) -> String {
    let url = &request.url;
    let mut out = format!("{id} {} {url}\n", request.method);

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    out.push_str(&format!("HOST: {host}\nPATH: {}\n", url.path()));
    if let Some(query) = url.query() {
        out.push_str(&format!("QUERY: {query}\n"));
    }
    out.push('\n');

    for (name, value) in &request.headers {
        out.push_str(&format!("{name}: {value}\n"));
    }
    if let Some(text) = request.body.as_deref().and_then(body_text) {
        out.push('\n');
        out.push_str(text);
        out.push('\n');
    }

    let sent_at = sent_at.to_rfc3339_opts(SecondsFormat::Millis, true);
    out.push_str(&format!("{RULE}END REQUEST {id} ({sent_at}){RULE}"));
    out
}

/// Exactly one of status+headers+body or the error description is rendered.
pub fn render_outcome(
    id: CorrelationId,
    outcome: Result<&HttpResponse, &TransportError>,
    elapsed: Duration,
) -> String {
    let elapsed = format!("{:.3}s", elapsed.as_secs_f64());
    let mut out = format!("{id} ELAPSED TIME: {elapsed}\n");

    let kind = match outcome {
        Ok(response) => {
            out.push_str(&format!("HTTP {}\n", response.status));
            for (name, value) in &response.headers {
                out.push_str(&format!("{name}: {value}\n"));
            }
            if let Some(text) = body_text(&response.body) {
                out.push('\n');
                out.push_str(text);
                out.push('\n');
            }
            "RESPONSE"
        }
        Err(e) => {
            out.push_str(&format!("{e}\n"));
            "ERROR"
        }
    };

    out.push_str(&format!("{RULE}END {kind} {id} ({elapsed}){RULE}"));
    out
}

fn body_text(body: &[u8]) -> Option<&str> {
    match std::str::from_utf8(body) {
        Ok(text) if !text.is_empty() => Some(text),
        _ => None,
    }
}

/// Emits a request record before a call and the paired response/error
/// record after it.
#[derive(Clone)]
pub struct NetworkLogger {
    formatter: RequestLogFormatter,
    sink: Arc<dyn LogSink>,
    target: String,
}

impl std::fmt::Debug for NetworkLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkLogger")
            .field("formatter", &self.formatter)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl NetworkLogger {
    pub fn new(ids: Arc<CorrelationIdGenerator>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            formatter: RequestLogFormatter::new(ids),
            sink,
            target: "network".to_string(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn log_request(&self, request: &HttpRequest) -> CorrelationId {
        let (id, record) = self.formatter.format_request(request);
        self.emit(Level::Info, &record);
        id
    }

    pub fn log_outcome(
        &self,
        id: CorrelationId,
        outcome: Result<&HttpResponse, &TransportError>,
        elapsed: Duration,
    ) {
        let level = if outcome.is_ok() {
            Level::Info
        } else {
            Level::Warn
        };
        let record = self.formatter.format_response(id, outcome, elapsed);
        self.emit(level, &record);
    }

    fn emit(&self, level: Level, record: &str) {
        let emitted = panic::catch_unwind(AssertUnwindSafe(|| {
            self.sink.emit(level, &self.target, record);
        }));
        if emitted.is_err() {
            log::warn!("log sink panicked, record dropped");
        }
    }

    /// Log `request`, drive `call` to completion and log its outcome.
    ///
    /// The outcome is returned untouched. If the returned future is dropped
    /// before `call` finishes, a `request cancelled` error record is still
    /// emitted for the issued ID. A `call` that panics gets no outcome record.
    pub async fn instrument<F>(
        &self,
        request: &HttpRequest,
        call: F,
    ) -> Result<HttpResponse, TransportError>
    where
        F: Future<Output = Result<HttpResponse, TransportError>>,
    {
        let id = self.log_request(request);
        let mut pending = PendingCall {
            logger: self,
            id,
            started: Utc::now(),
            finished: false,
        };
        let outcome = call.await;
        pending.finish(outcome.as_ref());
        outcome
    }
}

struct PendingCall<'a> {
    logger: &'a NetworkLogger,
    id: CorrelationId,
    started: DateTime<Utc>,
    finished: bool,
}

impl PendingCall<'_> {
    fn finish(&mut self, outcome: Result<&HttpResponse, &TransportError>) {
        self.finished = true;
        let elapsed = (Utc::now() - self.started).to_std().unwrap_or_default();
        self.logger.log_outcome(self.id, outcome, elapsed);
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        if !self.finished && !std::thread::panicking() {
            self.finish(Err(&TransportError::Cancelled));
        }
    }
}

/// A [`Transport`] that records every call through a [`NetworkLogger`].
#[derive(Debug)]
pub struct LoggedTransport<T> {
    inner: T,
    logger: NetworkLogger,
}

impl<T> LoggedTransport<T> {
    pub fn new(inner: T, logger: NetworkLogger) -> Self {
        Self { inner, logger }
    }

    pub fn logger(&self) -> &NetworkLogger {
        &self.logger
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Transport + Send + Sync> Transport for LoggedTransport<T> {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.logger
            .instrument(request, self.inner.send(request))
            .await
    }
}
