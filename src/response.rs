//! Response body formatting.
//!
//! Given the raw transport output and the declared response type, produce
//! the payload the lifecycle resolves or rejects with. JSON is parsed with
//! a graceful fallback to the raw text; `script`/`jsonp` bodies are handed
//! to a hook supplied by the caller's environment.

use log::warn;

/// Declared response type of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclaredType {
    /// Accept anything, the `"*"` of the call parameters. The default.
    #[default]
    Any,
    /// XML.
    Xml,
    /// HTML.
    Html,
    /// Plain text.
    Text,
    /// JSON, parsed into a value with raw-text fallback.
    Json,
    /// A script body, handed to the JSONP hook.
    Script,
    /// A JSONP body, handed to the JSONP hook.
    Jsonp,
}

impl DeclaredType {
    /// Parse the call-parameter shape of the type. Unknown values map to
    /// [`DeclaredType::Any`].
    pub fn from_param(value: &str) -> Self {
        match value {
            "xml" => DeclaredType::Xml,
            "html" => DeclaredType::Html,
            "text" => DeclaredType::Text,
            "json" => DeclaredType::Json,
            "script" => DeclaredType::Script,
            "jsonp" => DeclaredType::Jsonp,
            _ => DeclaredType::Any,
        }
    }

    /// The call-parameter spelling of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclaredType::Any => "*",
            DeclaredType::Xml => "xml",
            DeclaredType::Html => "html",
            DeclaredType::Text => "text",
            DeclaredType::Json => "json",
            DeclaredType::Script => "script",
            DeclaredType::Jsonp => "jsonp",
        }
    }
}

/// Default Content-Type for request bodies.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Default Accept header for a declared type.
pub fn default_accept(declared: DeclaredType) -> &'static str {
    match declared {
        DeclaredType::Xml => "application/xml, text/xml",
        DeclaredType::Html => "text/html",
        DeclaredType::Text => "text/plain",
        DeclaredType::Json => "application/json, text/javascript",
        DeclaredType::Script => "application/javascript, text/javascript",
        _ => "text/javascript, text/html, application/xml, text/xml, */*",
    }
}

/// A formatted response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Plain body text. Also the fallback for failed JSON parses and for
    /// script/jsonp bodies when no hook is installed.
    Text(String),

    /// A parsed JSON value.
    Json(serde_json::Value),
}

impl Payload {
    /// The body as text, when it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(v) => Some(v),
            Payload::Json(_) => None,
        }
    }

    /// The body as a parsed JSON value, when it is one.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Text(_) => None,
            Payload::Json(v) => Some(v),
        }
    }
}

/// JSONP response extraction hook supplied by the caller's environment.
///
/// This crate only defines the hook point; the execution mechanism lives
/// with the embedder.
pub type JsonpHook = Box<dyn Fn(&str) -> Payload + Send + Sync>;

/// Format a raw transport body according to the declared type.
///
/// Malformed JSON is degraded to the raw text with a logged warning, never
/// a hard error.
pub fn format(raw: &str, declared: DeclaredType, jsonp: Option<&JsonpHook>) -> Payload {
    match declared {
        DeclaredType::Json if !raw.is_empty() => match serde_json::from_str(raw) {
            Ok(value) => Payload::Json(value),
            Err(e) => {
                warn!("failed JSON parse, returning plain text: '{}' ({})", raw, e);
                Payload::Text(raw.to_string())
            }
        },
        DeclaredType::Script | DeclaredType::Jsonp => match jsonp {
            Some(hook) => hook(raw),
            None => Payload::Text(raw.to_string()),
        },
        _ => Payload::Text(raw.to_string()),
    }
}
