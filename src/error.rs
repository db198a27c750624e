use std::fmt;

/// Error type for xhr-core
///
/// These are the synchronous, caller-facing faults. Anything that happens
/// after a transport has been acquired is not an `Error` but a structured
/// [`Rejection`][crate::lifecycle::Rejection] payload, so callers always
/// receive the request/response context instead of an unhandled fault.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
#[non_exhaustive]
pub enum Error {
    NoTransportAvailable(String),
    MissingUrl,
    NotOpened,
    BadMethod(String),
    BadHeader(String),
    OpenFailed(String),
    SendFailed(String),
    HeaderParseFail(String),
}

impl From<httparse::Error> for Error {
    fn from(value: httparse::Error) -> Self {
        Error::HeaderParseFail(value.to_string())
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoTransportAvailable(v) => write!(f, "no transport available: {}", v),
            Error::MissingUrl => write!(f, "missing request URL"),
            Error::NotOpened => write!(f, "request channel is not opened"),
            Error::BadMethod(v) => write!(f, "bad method: {}", v),
            Error::BadHeader(v) => write!(f, "bad header: {}", v),
            Error::OpenFailed(v) => write!(f, "transport open failed: {}", v),
            Error::SendFailed(v) => write!(f, "transport send failed: {}", v),
            Error::HeaderParseFail(v) => write!(f, "response header parse fail: {}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_detail() {
        let err = Error::NoTransportAvailable("no constructor in runtime".into());
        assert_eq!(
            err.to_string(),
            "no transport available: no constructor in runtime"
        );

        assert_eq!(Error::MissingUrl.to_string(), "missing request URL");
        assert_eq!(
            Error::SendFailed("socket refused".into()).to_string(),
            "transport send failed: socket refused"
        );
    }

    #[test]
    fn from_httparse_error() {
        let error: Error = httparse::Error::HeaderName.into();
        assert!(matches!(error, Error::HeaderParseFail(_)));
    }
}
