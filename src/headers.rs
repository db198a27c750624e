//! Response header block parsing.
//!
//! Transports expose response headers the way the native clients do: one
//! raw, CRLF separated block of text. Single-header lookups parse that
//! block into a proper [`HeaderMap`] instead of scanning it by hand.

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::Error;

/// Max number of response headers we parse from a raw block.
pub const MAX_RESPONSE_HEADERS: usize = 128;

/// Parse a raw response header block into a `HeaderMap`.
///
/// The block is the `getAllResponseHeaders()` shape: `Name: value\r\n`
/// rows, with or without the terminating blank line.
pub fn parse_header_block(raw: &str) -> Result<HeaderMap, Error> {
    // httparse wants the terminating blank line.
    let mut block = raw.trim_end().to_string();
    block.push_str("\r\n\r\n");

    let mut headers = [httparse::EMPTY_HEADER; MAX_RESPONSE_HEADERS];
    let parsed = match httparse::parse_headers(block.as_bytes(), &mut headers)? {
        httparse::Status::Complete((_, parsed)) => parsed,
        httparse::Status::Partial => {
            return Err(Error::HeaderParseFail("incomplete header block".into()))
        }
    };

    let mut map = HeaderMap::new();
    for header in parsed {
        let name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|e| Error::HeaderParseFail(e.to_string()))?;
        let value = HeaderValue::from_bytes(header.value)
            .map_err(|e| Error::HeaderParseFail(e.to_string()))?;
        map.append(name, value);
    }

    Ok(map)
}

/// Look up a single header in a raw response header block.
///
/// Lookups are case-insensitive. A malformed block yields `None`.
pub fn header_value(raw: &str, name: &str) -> Option<String> {
    let map = parse_header_block(raw).ok()?;
    map.get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
