//! Test support: a scripted transport and a scenario builder.

use std::sync::{Arc, Mutex};

use http::Method;
use tokio::sync::mpsc;

use crate::settings::{StaticSettings, TIMEOUT_KEY};
use crate::transport::{Runtime, Transport, TransportEvent};
use crate::Error;

use super::Xhr;

mod state_loading;

/// Everything the mock transport records or is configured with.
#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub opened: Option<OpenRecord>,
    pub sent: bool,
    pub sent_body: Option<Vec<u8>>,
    pub send_error: Option<String>,
    pub aborted: bool,
    pub headers: Vec<(String, String)>,
    pub timeout_ms: Option<u64>,
    pub with_credentials: Option<bool>,
    pub mime_override: Option<String>,
    pub response_text: String,
    pub response_headers: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenRecord {
    pub method: Method,
    pub url: String,
    pub is_async: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// A transport whose behavior is scripted from the outside via
/// [`MockHandle`].
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
}

/// The test's side of a [`MockTransport`]: emit events, tweak the
/// in-flight response text, inspect what the lifecycle did.
#[derive(Clone)]
pub(crate) struct MockHandle {
    state: Arc<Mutex<MockState>>,
    sender: mpsc::UnboundedSender<TransportEvent>,
}

pub(crate) fn mock_pair(send_error: Option<String>) -> (MockTransport, MockHandle) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let state = Arc::new(Mutex::new(MockState {
        send_error,
        ..Default::default()
    }));

    let transport = MockTransport {
        state: state.clone(),
        events: Some(receiver),
    };
    let handle = MockHandle { state, sender };

    (transport, handle)
}

impl MockHandle {
    pub fn done(&self, status: u16, status_text: &str, body: &str) {
        // The lifecycle may already have settled and dropped the receiver.
        let _ = self.sender.send(TransportEvent::Done {
            status,
            status_text: status_text.to_string(),
            body: body.to_string(),
        });
    }

    pub fn loading(&self, status: u16, partial_body: &str) {
        let _ = self.sender.send(TransportEvent::Loading {
            status,
            partial_body: partial_body.to_string(),
        });
    }

    pub fn set_response_text(&self, text: &str) {
        self.state.lock().unwrap().response_text = text.to_string();
    }

    pub fn set_response_headers(&self, block: &str) {
        self.state.lock().unwrap().response_headers = Some(block.to_string());
    }

    pub fn opened(&self) -> OpenRecord {
        self.state
            .lock()
            .unwrap()
            .opened
            .clone()
            .expect("transport was not opened")
    }

    pub fn sent_body(&self) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        assert!(state.sent, "transport was not sent");
        state.sent_body.clone()
    }

    pub fn aborted(&self) -> bool {
        self.state.lock().unwrap().aborted
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    pub fn with_credentials(&self) -> Option<bool> {
        self.state.lock().unwrap().with_credentials
    }

    pub fn timeout_ms(&self) -> Option<u64> {
        self.state.lock().unwrap().timeout_ms
    }
}

impl Transport for MockTransport {
    fn open(
        &mut self,
        method: &Method,
        url: &str,
        is_async: bool,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), Error> {
        self.state.lock().unwrap().opened = Some(OpenRecord {
            method: method.clone(),
            url: url.to_string(),
            is_async,
            username: username.map(str::to_string),
            password: password.map(str::to_string),
        });
        Ok(())
    }

    fn send(&mut self, body: Option<&[u8]>) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(msg) = &state.send_error {
            return Err(Error::SendFailed(msg.clone()));
        }
        state.sent = true;
        state.sent_body = body.map(|b| b.to_vec());
        Ok(())
    }

    fn abort(&mut self) {
        self.state.lock().unwrap().aborted = true;
    }

    fn set_request_header(&mut self, name: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .headers
            .push((name.to_string(), value.to_string()));
    }

    fn override_mime_type(&mut self, mime_type: &str) {
        self.state.lock().unwrap().mime_override = Some(mime_type.to_string());
    }

    fn set_timeout(&mut self, timeout_ms: u64) {
        self.state.lock().unwrap().timeout_ms = Some(timeout_ms);
    }

    fn set_with_credentials(&mut self, flag: bool) {
        self.state.lock().unwrap().with_credentials = Some(flag);
    }

    fn response_text(&self) -> String {
        self.state.lock().unwrap().response_text.clone()
    }

    fn all_response_headers(&self) -> Option<String> {
        self.state.lock().unwrap().response_headers.clone()
    }

    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.events.take()
    }
}

/// Runtime holding one pre-built mock transport, exposed as either the
/// standard or the mobile family.
pub(crate) struct ScenarioRuntime {
    transport: Mutex<Option<MockTransport>>,
    mobile: bool,
}

impl Runtime for ScenarioRuntime {
    fn create_standard(&self) -> Result<Box<dyn Transport>, Error> {
        if self.mobile {
            return Err(Error::NoTransportAvailable("standard unavailable".into()));
        }
        let transport = self
            .transport
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| Error::NoTransportAvailable("already taken".into()))?;
        Ok(Box::new(transport))
    }

    fn create_mobile(&self) -> Option<Box<dyn Transport>> {
        if !self.mobile {
            return None;
        }
        self.transport
            .lock()
            .unwrap()
            .take()
            .map(|t| Box::new(t) as Box<dyn Transport>)
    }
}

/// Builder for a lifecycle wired to a scripted transport.
#[derive(Default)]
pub(crate) struct Scenario {
    mobile: bool,
    send_error: Option<String>,
    timeout: Option<u64>,
}

impl Scenario {
    pub fn builder() -> Self {
        Scenario::default()
    }

    /// Expose the transport as the mobile family (poll guard attached).
    pub fn mobile(mut self) -> Self {
        self.mobile = true;
        self
    }

    /// Make the transport's send fail synchronously.
    pub fn send_error(mut self, msg: &str) -> Self {
        self.send_error = Some(msg.to_string());
        self
    }

    /// Configure the `xhr.timeout` setting.
    pub fn timeout(mut self, ms: u64) -> Self {
        self.timeout = Some(ms);
        self
    }

    /// Build the lifecycle without opening it.
    pub fn build(self) -> (Xhr, MockHandle) {
        let (transport, handle) = mock_pair(self.send_error);

        let runtime = Arc::new(ScenarioRuntime {
            transport: Mutex::new(Some(transport)),
            mobile: self.mobile,
        });

        let mut settings = StaticSettings::new();
        if let Some(ms) = self.timeout {
            settings = settings.set(TIMEOUT_KEY, ms.to_string());
        }

        (Xhr::new(runtime, &settings), handle)
    }

    /// Build and open a plain GET lifecycle.
    pub fn open(self) -> (Xhr, MockHandle) {
        let (mut xhr, handle) = self.build();
        xhr.open(Method::GET, "https://q.test", true, None, None)
            .unwrap();
        (xhr, handle)
    }
}
