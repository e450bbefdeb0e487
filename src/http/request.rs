//! Fully-parsed representation of one inbound admin request.

use crate::{
    http::{path, query},
    server::transport::Exchange,
};
use serde_json::Value;
use std::{collections::HashMap, error, fmt, io};

// METHOD

/// HTTP request methods understood by the admin API.
///
/// `TRACE` and `CONNECT` are deliberately absent; a request carrying any
/// verb outside this set is rejected before routing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - read a resource projection
    Get,
    /// PUT - replace a resource
    Put,
    /// POST - trigger a resource-specific action
    Post,
    /// HEAD - GET without a response body
    Head,
    /// PATCH - partial modification
    Patch,
    /// DELETE - remove a resource
    Delete,
    /// OPTIONS - describe communication options
    Options,
}

impl Method {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw {
            "GET" => Some(Method::Get),
            "PUT" => Some(Method::Put),
            "POST" => Some(Method::Post),
            "HEAD" => Some(Method::Head),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            "OPTIONS" => Some(Method::Options),
            _ => None,
        }
    }

    /// Canonical upper-case spelling of the method.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Head => "HEAD",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

// PARSED REQUEST

/// An immutable, fully-validated admin request.
///
/// Built once per dispatch from the raw transport fields; both grammar
/// validators must accept their input in entirety or the request never
/// reaches the router.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    method: Method,
    segments: Vec<String>,
    params: HashMap<String, String>,
}

impl ParsedRequest {
    pub(crate) fn parse(method: &str, raw_path: &str, raw_query: &str) -> Result<Self, Error> {
        let method = Method::parse(method).ok_or_else(|| Error::Method(method.to_owned()))?;
        let segments = path::parse(raw_path)?;
        let params = query::parse(raw_query)?;

        Ok(Self {
            method,
            segments,
            params,
        })
    }

    /// The request method.
    pub const fn method(&self) -> Method {
        self.method
    }

    /// The path segment at `index`, if present.
    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// All non-empty path segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The query parameter named `key`, if present.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Why a raw request failed validation before routing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Error {
    Method(String),
    Path(path::Error),
    Query(query::Error),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Method(raw) => write!(f, "Unrecognized request method {raw:?}."),
            Error::Path(err) => err.fmt(f),
            Error::Query(err) => err.fmt(f),
        }
    }
}

impl From<path::Error> for Error {
    fn from(err: path::Error) -> Self {
        Error::Path(err)
    }
}

impl From<query::Error> for Error {
    fn from(err: query::Error) -> Self {
        Error::Query(err)
    }
}

// BODY

/// Bounded body-read capability handed to resource handlers.
///
/// Reads at most `limit` bytes from the exchange; a body that fills the
/// whole bound is rejected rather than truncated, so a handler can never
/// act on a partial payload.
pub struct BodyReader<'a> {
    exchange: &'a mut dyn Exchange,
    limit: usize,
}

impl<'a> BodyReader<'a> {
    pub(crate) fn new(exchange: &'a mut dyn Exchange, limit: usize) -> Self {
        Self { exchange, limit }
    }

    /// Reads and parses a required JSON body.
    pub fn read_json(&mut self) -> Result<Value, BodyError> {
        match self.read_json_optional()? {
            Some(value) => Ok(value),
            None => Err(BodyError::Malformed),
        }
    }

    /// Reads and parses a JSON body, treating an absent body as `None`.
    pub fn read_json_optional(&mut self) -> Result<Option<Value>, BodyError> {
        let mut data = vec![0u8; self.limit];
        let mut len = 0usize;

        loop {
            let read = self.exchange.read_body(&mut data[len..])?;
            if read == 0 {
                break;
            }

            len += read;
            if len >= self.limit {
                return Err(BodyError::TooLarge);
            }
        }

        if len == 0 {
            return Ok(None);
        }

        let text = simdutf8::basic::from_utf8(&data[..len]).map_err(|_| BodyError::NotUtf8)?;
        let value = serde_json::from_str(text).map_err(|_| BodyError::Malformed)?;

        Ok(Some(value))
    }
}

/// Why a request body could not be used.
#[derive(Debug)]
pub enum BodyError {
    /// The body reached the configured size bound.
    TooLarge,
    /// The body is not valid UTF-8.
    NotUtf8,
    /// The body is not well-formed JSON.
    Malformed,
    /// The transport failed mid-read.
    Io(io::Error),
}

impl error::Error for BodyError {}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyError::TooLarge => write!(f, "Request content is too large."),
            BodyError::NotUtf8 => write!(f, "Request content is not valid UTF-8."),
            BodyError::Malformed => write!(f, "Unable to parse the request content."),
            BodyError::Io(_) => write!(f, "Unable to read the request content."),
        }
    }
}

impl From<io::Error> for BodyError {
    fn from(err: io::Error) -> Self {
        BodyError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::transport::testing::StaticExchange;

    #[test]
    fn parses_all_components() {
        let req = ParsedRequest::parse("GET", "/players/2", "verbose=1").unwrap();

        assert_eq!(req.method(), Method::Get);
        assert_eq!(req.segments(), ["players", "2"]);
        assert_eq!(req.segment(0), Some("players"));
        assert_eq!(req.segment(2), None);
        assert_eq!(req.query("verbose"), Some("1"));
        assert_eq!(req.query("missing"), None);
    }

    #[test]
    fn rejects_unknown_method() {
        assert!(matches!(
            ParsedRequest::parse("BREW", "/server", ""),
            Err(Error::Method(_))
        ));
    }

    #[test]
    fn propagates_grammar_errors() {
        assert!(matches!(
            ParsedRequest::parse("GET", "no-slash", ""),
            Err(Error::Path(path::Error::NotAbsolute))
        ));
        assert!(matches!(
            ParsedRequest::parse("GET", "/server", "a=1&a=2"),
            Err(Error::Query(query::Error::Duplicate(_)))
        ));
    }

    #[test]
    fn body_within_bound() {
        let mut exchange = StaticExchange::with_body(br#"{"message":"hello"}"#);
        let value = BodyReader::new(&mut exchange, 64).read_json().unwrap();

        assert_eq!(value["message"], "hello");
    }

    #[test]
    fn body_at_bound_rejected() {
        let mut exchange = StaticExchange::with_body(&[b' '; 64]);

        assert!(matches!(
            BodyReader::new(&mut exchange, 64).read_json(),
            Err(BodyError::TooLarge)
        ));
    }

    #[test]
    fn empty_body() {
        let mut exchange = StaticExchange::with_body(b"");

        assert!(matches!(
            BodyReader::new(&mut exchange, 64).read_json(),
            Err(BodyError::Malformed)
        ));

        let mut exchange = StaticExchange::with_body(b"");
        assert!(BodyReader::new(&mut exchange, 64)
            .read_json_optional()
            .unwrap()
            .is_none());
    }

    #[test]
    fn garbage_body_rejected() {
        let mut exchange = StaticExchange::with_body(b"not json");

        assert!(matches!(
            BodyReader::new(&mut exchange, 64).read_json(),
            Err(BodyError::Malformed)
        ));

        let mut exchange = StaticExchange::with_body(&[0xff, 0xfe, 0x01]);
        assert!(matches!(
            BodyReader::new(&mut exchange, 64).read_json(),
            Err(BodyError::NotUtf8)
        ));
    }
}
