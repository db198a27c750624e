//! Transport and runtime capability traits.
//!
//! A [`Transport`] is the opaque handle to whatever native HTTP client the
//! current runtime provides. It is exclusively owned by one lifecycle
//! instance, never shared or reused across requests.
//!
//! Progress is delivered over an event channel instead of a callback: the
//! lifecycle takes the receiver once at open time and reacts to
//! [`TransportEvent`]s until the first terminal verdict.

use http::Method;
use tokio::sync::mpsc;

use crate::Error;

/// Progress notification emitted by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Intermediate progress with whatever body text has arrived so far.
    ///
    /// Only the mobile transport produces meaningful loading events; the
    /// lifecycle ignores them everywhere else.
    Loading {
        /// HTTP status as reported mid-flight.
        status: u16,
        /// Response body text available at this point.
        partial_body: String,
    },

    /// Terminal notification, the request is fully complete.
    Done {
        /// Final HTTP status. May be a legacy alias such as 1223.
        status: u16,
        /// Status text as reported by the transport.
        status_text: String,
        /// The complete response body text.
        body: String,
    },
}

/// Opaque handle to a native HTTP client.
pub trait Transport: Send {
    /// Open the request channel.
    fn open(
        &mut self,
        method: &Method,
        url: &str,
        is_async: bool,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), Error>;

    /// Send the request, with an optional body.
    ///
    /// A synchronous failure here is recovered by the lifecycle into an
    /// error rejection, it never propagates as a fault.
    fn send(&mut self, body: Option<&[u8]>) -> Result<(), Error>;

    /// Forcibly end the transport-level operation. Idempotent.
    fn abort(&mut self);

    /// Set a request header on the native client.
    fn set_request_header(&mut self, name: &str, value: &str);

    /// Override the response mime type.
    fn override_mime_type(&mut self, mime_type: &str);

    /// Set the transport-level timeout in milliseconds.
    fn set_timeout(&mut self, timeout_ms: u64);

    /// Set the credentials flag (CORS). Transports without the concept
    /// ignore it.
    fn set_with_credentials(&mut self, flag: bool) {
        let _ = flag;
    }

    /// The response body text available right now, complete or not.
    fn response_text(&self) -> String;

    /// The raw response header block, CRLF separated, once headers are in.
    fn all_response_headers(&self) -> Option<String>;

    /// Take the event receiver. Returns `None` on every call after the
    /// first; the lifecycle takes it exactly once at open time.
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>>;
}

/// Which transport families the current runtime exposes.
///
/// This replaces the original implicit probing of globals: the embedder
/// states explicitly what can be constructed, which makes the provider's
/// fallback order deterministic and testable without the actual runtime.
pub trait Runtime: Send + Sync {
    /// Construct the runtime's standard transport.
    fn create_standard(&self) -> Result<Box<dyn Transport>, Error>;

    /// Whether a legacy ActiveX-style constructor family is present at all.
    fn has_legacy_family(&self) -> bool {
        false
    }

    /// Construct a legacy transport by constructor identifier.
    fn create_legacy(&self, ident: &str) -> Result<Box<dyn Transport>, Error> {
        Err(Error::NoTransportAvailable(format!(
            "no legacy family for {}",
            ident
        )))
    }

    /// The mobile HTTP client, when this runtime is the mobile one.
    fn create_mobile(&self) -> Option<Box<dyn Transport>> {
        None
    }
}
