//! The request lifecycle state machine.
//!
//! One [`Xhr`] instance owns one transport, one request record and one
//! completion outcome. The states are:
//!
//! * **Idle** - nothing has happened yet
//! * **Opened** - a transport is acquired and the request channel is open
//! * **Sent** - the request is on the wire, events and the timeout timer race
//! * **Succeeded / Failed / TimedOut** - terminal, mutually exclusive,
//!   reached at most once per lifecycle
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌──────────┐
//! │   Idle   │────▶│  Opened  │────▶│   Sent   │
//! └──────────┘     └──────────┘     └──────────┘
//!                                         │
//!                        ┌────────────────┼────────────────┐
//!                        ▼                ▼                ▼
//!                  ┌──────────┐    ┌──────────┐     ┌──────────┐
//!                  │Succeeded │    │  Failed  │     │ TimedOut │
//!                  └──────────┘    └──────────┘     └──────────┘
//! ```
//!
//! The central invariant is that the outcome settles exactly once. Transport
//! events and the timeout timer race; whichever fires first wins, and the
//! loser's notifications are observed and discarded by an explicit settle
//! guard rather than by incidental timing.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use log::{debug, error};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Duration, Instant};

use crate::guard::{PollGuard, PollVerdict};
use crate::headers;
use crate::provider;
use crate::response::{self, default_accept, DeclaredType, JsonpHook, Payload, DEFAULT_CONTENT_TYPE};
use crate::settings::{Settings, DEFAULT_TIMEOUT_MS, TIMEOUT_KEY};
use crate::transport::{Runtime, Transport, TransportEvent};
use crate::Error;

#[cfg(test)]
mod test;

/// Alias some legacy clients report instead of 204 No Content.
const NO_CONTENT_ALIAS: u16 = 1223;

/// Settling time granted on top of the configured timeout, so the
/// transport's own timeout handling gets a chance to fire first.
const TIMEOUT_GRACE: Duration = Duration::from_millis(1000);

const TIMEOUT_STATUS: u16 = 408;
const TIMEOUT_TEXT: &str = "Request Timeout";

/// Lifecycle states. See the [module docs][self] for the state graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Nothing has happened yet.
    #[default]
    Idle,
    /// Transport acquired, request channel open.
    Opened,
    /// Request on the wire.
    Sent,
    /// Terminal: resolved with a [`Reply`].
    Succeeded,
    /// Terminal: rejected with a [`Rejection`].
    Failed,
    /// Terminal: rejected with the fixed 408 payload.
    TimedOut,
}

impl LifecycleState {
    /// Whether this is one of the mutually exclusive terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Succeeded | LifecycleState::Failed | LifecycleState::TimedOut
        )
    }
}

/// A request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Text content. Lone line feeds are normalized to CRLF pairs when sent.
    Text(String),
    /// Opaque bytes, sent as-is.
    Bytes(Vec<u8>),
}

impl Body {
    fn normalize_newlines(self) -> Body {
        match self {
            Body::Text(s) => Body::Text(crlf_normalize(&s)),
            b => b,
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        match self {
            Body::Text(s) => s.into_bytes(),
            Body::Bytes(b) => b,
        }
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Bytes(value)
    }
}

/// The request record. Created at call start, immutable once sent, moved
/// into the resolution payload when the lifecycle settles.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Request method.
    pub method: Method,
    /// Request url, including any appended query parameters.
    pub url: String,
    /// Headers applied to the transport.
    pub headers: HeaderMap,
    /// The request body, after newline normalization.
    pub body: Option<Body>,
    /// Declared response type.
    pub declared_type: DeclaredType,
    /// Timeout in milliseconds. Zero disables the timer.
    pub timeout: u64,
    /// The cache flag from the call parameters.
    pub cache: Option<bool>,
    /// The CORS credentials flag, when explicitly set.
    pub with_credentials: Option<bool>,
    /// Explicit Accept override from the call parameters.
    pub accepts: Option<String>,
    /// Explicit Content-Type override from the call parameters.
    pub content_type: Option<String>,
    /// HTTP basic auth username.
    pub username: Option<String>,
    /// HTTP basic auth password.
    pub password: Option<String>,
}

/// Resolution payload of a successful request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// The request this reply answers.
    pub request: Request,
    /// The formatted response body.
    pub response: Payload,
    /// Final status, normalized (1223 reads as 204).
    pub status: u16,
    /// Status text as reported by the transport.
    pub status_text: String,
}

/// Rejection payload of a failed or timed out request.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// The request that failed.
    pub request: Request,
    /// The formatted response body, or the fixed timeout text.
    pub response: Payload,
    /// Final status. 408 on timeout, 0 when the transport never produced one.
    pub status: u16,
    /// Status text.
    pub status_text: String,
    /// The triggering exception, present when the failure originated from
    /// a synchronous send-time fault.
    pub exception: Option<Error>,
}

/// The single resolution of one request.
pub type CallResult = Result<Reply, Rejection>;

/// Data for a [`call`][Xhr::call].
///
/// For GET and HEAD this becomes the query string; for every other method
/// it becomes the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallData {
    /// Raw text, appended or sent as-is.
    Text(String),
    /// Opaque bytes.
    Bytes(Vec<u8>),
    /// Key/value pairs, joined as `k=v&k2=v2` in the given order.
    Pairs(Vec<(String, String)>),
}

impl CallData {
    fn query_string(&self) -> String {
        match self {
            CallData::Text(s) => s.clone(),
            CallData::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            CallData::Pairs(pairs) => pairs
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&"),
        }
    }

    fn into_body(self) -> Body {
        match self {
            CallData::Text(s) => Body::Text(s),
            CallData::Bytes(b) => Body::Bytes(b),
            pairs @ CallData::Pairs(_) => Body::Text(pairs.query_string()),
        }
    }
}

/// Content-Type resolution for a [`call`][Xhr::call].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContentType {
    /// Send the urlencoded default, [`DEFAULT_CONTENT_TYPE`].
    #[default]
    Default,
    /// Send this explicit value.
    Explicit(String),
    /// Send no Content-Type header at all.
    Omit,
}

/// Parameters for the [`call`][Xhr::call] convenience entry point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallParams {
    /// Request method, uppercased before use. Defaults to GET.
    pub method: Option<String>,
    /// Request url. Required.
    pub url: Option<String>,
    /// Declared response type. Defaults to [`DeclaredType::Any`].
    pub declared_type: Option<DeclaredType>,
    /// Explicit Accept header value.
    pub accepts: Option<String>,
    /// Content-Type resolution. Defaults to the urlencoded default.
    pub content_type: ContentType,
    /// Custom request headers.
    pub headers: Vec<(String, String)>,
    /// Request content.
    pub data: Option<CallData>,
    /// `Some(false)` appends a timestamp cache buster to the url.
    pub cache: Option<bool>,
    /// CORS credentials flag. `None` leaves the transport default.
    pub with_credentials: Option<bool>,
    /// HTTP basic auth username.
    pub username: Option<String>,
    /// HTTP basic auth password.
    pub password: Option<String>,
    /// Whether the transport opens asynchronously. Defaults to true.
    pub is_async: Option<bool>,
}

impl CallParams {
    /// Parameters for a request to `url`.
    pub fn to(url: impl Into<String>) -> Self {
        CallParams {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Set the request method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Set the declared response type.
    pub fn declared_type(mut self, declared: DeclaredType) -> Self {
        self.declared_type = Some(declared);
        self
    }

    /// Set an explicit Accept header value.
    pub fn accepts(mut self, accepts: impl Into<String>) -> Self {
        self.accepts = Some(accepts.into());
        self
    }

    /// Set an explicit Content-Type header value.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = ContentType::Explicit(content_type.into());
        self
    }

    /// Send the request without any Content-Type header.
    pub fn without_content_type(mut self) -> Self {
        self.content_type = ContentType::Omit;
        self
    }

    /// Add a custom request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request content.
    pub fn data(mut self, data: CallData) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the cache flag. `false` appends a timestamp cache buster.
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the CORS credentials flag.
    pub fn with_credentials(mut self, flag: bool) -> Self {
        self.with_credentials = Some(flag);
        self
    }

    /// Set HTTP basic auth credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set whether the transport opens asynchronously.
    pub fn is_async(mut self, is_async: bool) -> Self {
        self.is_async = Some(is_async);
        self
    }
}

/// The request lifecycle.
///
/// Owns the transport, the request record and the settle-once completion
/// state for one request at a time. Constructed with a [`Runtime`]
/// capability descriptor and a [`Settings`] accessor.
pub struct Xhr {
    runtime: Arc<dyn Runtime>,
    default_timeout: u64,
    jsonp: Option<JsonpHook>,
    transport: Option<Box<dyn Transport>>,
    guard: Option<PollGuard>,
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    request: Option<Request>,
    state: LifecycleState,
}

impl Xhr {
    /// Create a lifecycle for the given runtime.
    ///
    /// The default timeout is read from the `xhr.timeout` setting,
    /// 30000ms when absent.
    pub fn new(runtime: Arc<dyn Runtime>, settings: &dyn Settings) -> Self {
        let default_timeout = settings.get_u64(TIMEOUT_KEY, DEFAULT_TIMEOUT_MS);

        Xhr {
            runtime,
            default_timeout,
            jsonp: None,
            transport: None,
            guard: None,
            events: None,
            request: None,
            state: LifecycleState::Idle,
        }
    }

    /// Install the JSONP response extraction hook.
    pub fn with_jsonp_hook(mut self, hook: JsonpHook) -> Self {
        self.jsonp = Some(hook);
        self
    }

    /// The current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Open the request channel.
    ///
    /// Acquires a transport, takes its event receiver, opens it with the
    /// given credentials and applies the configured timeout. Initializes
    /// the request record with empty headers.
    pub fn open(
        &mut self,
        method: Method,
        url: &str,
        is_async: bool,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), Error> {
        let acquired = provider::acquire(self.runtime.as_ref())?;
        let mut transport = acquired.transport;

        self.events = transport.take_events();
        transport.open(&method, url, is_async, username, password)?;
        transport.set_timeout(self.default_timeout);

        debug!("opened {} {}", method, url);

        self.guard = acquired.guard;
        self.request = Some(Request {
            method,
            url: url.to_string(),
            headers: HeaderMap::new(),
            body: None,
            declared_type: DeclaredType::default(),
            timeout: self.default_timeout,
            cache: None,
            with_credentials: None,
            accepts: None,
            content_type: None,
            username: username.map(str::to_string),
            password: password.map(str::to_string),
        });
        self.transport = Some(transport);
        self.state = LifecycleState::Opened;

        Ok(())
    }

    /// Send the request and await its single resolution.
    ///
    /// Text bodies have lone line feeds normalized to CRLF pairs. When the
    /// configured timeout is non-zero, a timer of `timeout + 1000ms` races
    /// the transport events; on firing it produces the fixed 408 rejection
    /// and aborts the transport. Synchronous send faults are recovered
    /// into an error rejection carrying the exception.
    pub async fn send(&mut self, body: Option<Body>) -> Result<CallResult, Error> {
        if self.transport.is_none() || self.request.is_none() {
            return Err(Error::NotOpened);
        }

        let body = body.map(Body::normalize_newlines);

        let request = self.request.as_mut().expect("request checked above");
        request.body = body.clone();
        let timeout = request.timeout;

        let deadline =
            (timeout != 0).then(|| Instant::now() + Duration::from_millis(timeout) + TIMEOUT_GRACE);

        self.state = LifecycleState::Sent;

        let bytes = body.map(Body::into_bytes);
        let sent = self
            .transport
            .as_mut()
            .expect("transport checked above")
            .send(bytes.as_deref());

        if let Err(e) = sent {
            error!("error during request: {}", e);
            self.try_settle(LifecycleState::Failed);
            let sample = self
                .transport
                .as_ref()
                .map(|t| t.response_text())
                .unwrap_or_default();
            return Ok(Err(self.error_rejection(&sample, 0, String::new(), Some(e))));
        }

        Ok(self.drive(deadline).await)
    }

    /// Convenience entry point composing [`open`][Xhr::open] and
    /// [`send`][Xhr::send].
    ///
    /// Uppercases the method (default GET), resolves Accept/Content-Type
    /// from the declared type or explicit overrides (the Content-Type can
    /// also be omitted entirely), moves data into the
    /// query string for GET and HEAD, appends a timestamp cache buster when
    /// `cache` is `false`, applies all headers to the transport and
    /// delegates to `send`.
    pub async fn call(&mut self, params: CallParams) -> Result<CallResult, Error> {
        let CallParams {
            method,
            url,
            declared_type,
            accepts,
            content_type,
            headers,
            data,
            cache,
            with_credentials,
            username,
            password,
            is_async,
        } = params;

        let mut url = url.ok_or(Error::MissingUrl)?;

        let method_name = method.as_deref().unwrap_or("GET").to_uppercase();
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|_| Error::BadMethod(method_name.clone()))?;

        let declared = declared_type.unwrap_or_default();

        // GET and HEAD move data into the query string, every other
        // method keeps it as the request body.
        let mut data = data;
        if matches!(method, Method::GET | Method::HEAD) {
            if let Some(d) = data.take() {
                url = append_url(&url, &d.query_string());
            }
        }

        if cache == Some(false) {
            url = append_url(&url, &timestamp_ms().to_string());
        }

        self.open(
            method,
            &url,
            is_async.unwrap_or(true),
            username.as_deref(),
            password.as_deref(),
        )?;

        if let Some(flag) = with_credentials {
            if let Some(t) = self.transport.as_mut() {
                t.set_with_credentials(flag);
            }
        }

        {
            let request = self.request.as_mut().expect("request exists after open");
            request.declared_type = declared;
            request.cache = cache;
            request.with_credentials = with_credentials;
            request.accepts = accepts.clone();
            request.content_type = match &content_type {
                ContentType::Explicit(v) => Some(v.clone()),
                _ => None,
            };
        }

        let mut headers = headers;

        let accept = accepts.unwrap_or_else(|| default_accept(declared).to_string());
        put_header(&mut headers, "Accept", accept);

        match content_type {
            ContentType::Default => {
                put_header(&mut headers, "Content-Type", DEFAULT_CONTENT_TYPE.to_string())
            }
            ContentType::Explicit(v) => put_header(&mut headers, "Content-Type", v),
            ContentType::Omit => {}
        }

        if let Some(user) = &username {
            if !headers.iter().any(|(n, _)| n.eq_ignore_ascii_case("authorization")) {
                let creds = BASE64_STANDARD.encode(format!(
                    "{}:{}",
                    user,
                    password.as_deref().unwrap_or_default()
                ));
                put_header(&mut headers, "Authorization", format!("Basic {}", creds));
            }
        }

        for (name, value) in &headers {
            self.set_request_header(name, value)?;
        }

        self.send(data.map(CallData::into_body)).await
    }

    /// Abort the transport-level operation. A no-op before open.
    ///
    /// This does not itself settle the outcome; the transport is expected
    /// to follow up with a terminal notification.
    pub fn abort(&mut self) {
        if let Some(t) = self.transport.as_mut() {
            t.abort();
        }
    }

    /// Set a request header on the transport and record it. A no-op before
    /// open.
    pub fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        let Some(t) = self.transport.as_mut() else {
            return Ok(());
        };
        t.set_request_header(name, value);

        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::BadHeader(e.to_string()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| Error::BadHeader(e.to_string()))?;
        if let Some(request) = self.request.as_mut() {
            request.headers.insert(header_name, header_value);
        }

        Ok(())
    }

    /// Override the response mime type on the transport. A no-op before open.
    pub fn override_mime_type(&mut self, mime_type: &str) {
        if let Some(t) = self.transport.as_mut() {
            t.override_mime_type(mime_type);
        }
    }

    /// The raw response header block, once headers are in.
    pub fn get_all_response_headers(&self) -> Option<String> {
        self.transport.as_ref().and_then(|t| t.all_response_headers())
    }

    /// A single response header, parsed out of the raw block.
    pub fn get_response_header(&self, name: &str) -> Option<String> {
        let raw = self.get_all_response_headers()?;
        headers::header_value(&raw, name)
    }

    /// Update the stored default timeout. Applies from the next open.
    pub fn set_timeout(&mut self, timeout_ms: u64) {
        self.default_timeout = timeout_ms;
    }

    /// React to transport events and the timeout timer until the first
    /// terminal verdict.
    async fn drive(&mut self, deadline: Option<Instant>) -> CallResult {
        let timer = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(timer);

        loop {
            let event = {
                let Some(events) = self.events.as_mut() else {
                    // A transport that never handed out its event channel
                    // cannot complete.
                    self.try_settle(LifecycleState::Failed);
                    return Err(self.error_rejection("", 0, String::new(), None));
                };

                tokio::select! {
                    _ = &mut timer => None,
                    ev = events.recv() => Some(ev),
                }
            };

            match event {
                // The timer won the race.
                None => {
                    if self.try_settle(LifecycleState::TimedOut) {
                        if let Some(t) = self.transport.as_mut() {
                            t.abort();
                        }
                        return Err(self.timeout_rejection());
                    }
                }

                // The transport dropped its sender without a terminal event.
                Some(None) => {
                    debug!("event channel closed without a terminal event");
                    if self.try_settle(LifecycleState::Failed) {
                        let sample = self
                            .transport
                            .as_ref()
                            .map(|t| t.response_text())
                            .unwrap_or_default();
                        return Err(self.error_rejection(&sample, 0, String::new(), None));
                    }
                }

                Some(Some(ev)) => {
                    if let Some(result) = self.on_transport_event(ev).await {
                        return result;
                    }
                }
            }
        }
    }

    /// The state-change handler, invoked on every transport notification.
    ///
    /// Returns `None` when the notification does not settle the lifecycle:
    /// progress events below the error range, loading events on transports
    /// without a poll guard, and anything arriving after a terminal state.
    async fn on_transport_event(&mut self, event: TransportEvent) -> Option<CallResult> {
        match event {
            TransportEvent::Done {
                status,
                status_text,
                body,
            } => {
                let (status, success) = classify_status(status);

                if success {
                    if !self.try_settle(LifecycleState::Succeeded) {
                        return None;
                    }
                    Some(Ok(self.success_reply(&body, status, status_text)))
                } else {
                    if !self.try_settle(LifecycleState::Failed) {
                        return None;
                    }
                    Some(Err(self.error_rejection(&body, status, status_text, None)))
                }
            }

            TransportEvent::Loading {
                status,
                partial_body,
            } => {
                if self.state.is_terminal() {
                    debug!("loading event after {:?}, ignoring", self.state);
                    return None;
                }

                // Only the mobile transport carries a poll guard; loading
                // events from other transports are plain progress.
                let guard = self.guard.as_ref()?;

                if !(400..600).contains(&status) {
                    return None;
                }

                // The mobile transport does not reliably follow this up
                // with a terminal event. Give the error body time to
                // arrive, then abort and classify as error.
                debug!("loading event with status {}, starting poll guard", status);
                let verdict = {
                    let transport = self
                        .transport
                        .as_deref()
                        .expect("transport present while sent");
                    guard.check(&partial_body, || transport.response_text()).await
                };

                let body = match verdict {
                    PollVerdict::ContentObserved(b) => b,
                    PollVerdict::Exhausted => partial_body,
                };

                if !self.try_settle(LifecycleState::Failed) {
                    return None;
                }

                if let Some(t) = self.transport.as_mut() {
                    t.abort();
                }

                let status_text = canonical_reason(status);
                Some(Err(self.error_rejection(&body, status, status_text, None)))
            }
        }
    }

    /// Single-assignment settle guard: the first terminal writer wins,
    /// later writers are observed and discarded.
    fn try_settle(&mut self, next: LifecycleState) -> bool {
        if self.state.is_terminal() {
            debug!("notification after {:?}, ignoring {:?}", self.state, next);
            return false;
        }

        debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
        true
    }

    fn success_reply(&mut self, body: &str, status: u16, status_text: String) -> Reply {
        let request = self.request.take().expect("request exists after open");
        let response = response::format(body, request.declared_type, self.jsonp.as_ref());

        Reply {
            request,
            response,
            status,
            status_text,
        }
    }

    fn error_rejection(
        &mut self,
        body: &str,
        status: u16,
        status_text: String,
        exception: Option<Error>,
    ) -> Rejection {
        let request = self.request.take().expect("request exists after open");
        let response = response::format(body, request.declared_type, self.jsonp.as_ref());

        Rejection {
            request,
            response,
            status,
            status_text,
            exception,
        }
    }

    fn timeout_rejection(&mut self) -> Rejection {
        let request = self.request.take().expect("request exists after open");

        // The transport is being forcibly aborted concurrently; its actual
        // state is not consulted.
        Rejection {
            request,
            response: Payload::Text(TIMEOUT_TEXT.to_string()),
            status: TIMEOUT_STATUS,
            status_text: TIMEOUT_TEXT.to_string(),
            exception: None,
        }
    }
}

/// Normalize a raw transport status and classify it.
///
/// 1223 is a legacy alias for 204 No Content. 304 is served from cache and
/// counts as success.
fn classify_status(raw: u16) -> (u16, bool) {
    let status = if raw == NO_CONTENT_ALIAS { 204 } else { raw };
    let success =
        (200..300).contains(&status) || status == StatusCode::NOT_MODIFIED.as_u16();
    (status, success)
}

fn canonical_reason(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
        .to_string()
}

/// Convert lone line feeds to CRLF pairs, the wire convention the
/// transports expect.
fn crlf_normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cr = false;

    for c in s.chars() {
        if c == '\n' && !prev_cr {
            out.push('\r');
        }
        prev_cr = c == '\r';
        out.push(c);
    }

    out
}

/// Append parameters to a url, picking `?` or `&` as separator.
fn append_url(url: &str, parameters: &str) -> String {
    if parameters.is_empty() {
        return url.to_string();
    }

    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, sep, parameters)
}

/// Set a header in the pending list, replacing any existing entry
/// case-insensitively.
fn put_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    if let Some(entry) = headers
        .iter_mut()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
    {
        entry.1 = value;
    } else {
        headers.push((name.to_string(), value));
    }
}

fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
