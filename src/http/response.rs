//! Request outcomes and the wire-level response writer.

use crate::server::transport::Exchange;
use serde::Serialize;
use serde_json::{json, Value};
use std::io;

// STATUS

macro_rules! set_statuses {
    ($(
        $(#[$docs:meta])+
        $name:ident = ($num:expr, $str:expr);
    )+) => {
        /// Response status classifications emitted by the admin API.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Status { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $(#[$docs])+
            $name = $num,
        )+ }

        impl Status {
            // Full HTTP/1.0 status line, e.g. `"HTTP/1.0 200 OK\r\n"`.
            pub(crate) const fn line(&self) -> &'static str {
                match self { $(
                    Status::$name => concat!("HTTP/1.0 ", $num, " ", $str, "\r\n"),
                )+ }
            }
        }
    }
}

set_statuses! {
    /// Success with a JSON payload.
    Ok = (200, "OK");
    /// The action was accepted; nothing to report back.
    NoContent = (204, "No Content");
    /// Malformed path, query, or body.
    BadRequest = (400, "Bad Request");
    /// Unknown route, empty player slot, or failed precondition.
    NotFound = (404, "Not Found");
    /// Recognized path shape, wrong verb.
    MethodNotAllowed = (405, "Method Not Allowed");
    /// The request body reached the configured bound.
    PayloadTooLarge = (413, "Payload Too Large");
    /// The request head reached the configured bound.
    HeaderFieldsTooLarge = (431, "Request Header Fields Too Large");
    /// A response projection failed to serialize.
    InternalServerError = (500, "Internal Server Error");
}

// OUTCOME

/// The fully-formed result of handling one request, prior to wire
/// encoding. Constructed by a resource handler, consumed exactly once
/// by [`write`].
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Success with a JSON payload.
    Ok(Value),
    /// Success with no payload.
    NoContent,
    /// Client error with a specific message.
    BadRequest(String),
    /// Target resource missing, or a precondition failed.
    NotFound(String),
    /// Recognized path shape, wrong verb.
    MethodNotAllowed,
    /// Request body at or over the configured bound.
    PayloadTooLarge,
    /// A handler failed to build its response projection.
    Internal,
}

impl Outcome {
    /// Success payload built from any serializable projection.
    pub fn ok<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Outcome::Ok(value),
            // unreachable for the projections this crate builds, but a
            // handler bug must not take the whole subsystem down
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize response payload");
                Outcome::Internal
            }
        }
    }

    /// Client error with a specific message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Outcome::BadRequest(message.into())
    }

    /// Not-found with the generic message.
    pub fn not_found() -> Self {
        Outcome::NotFound("Target resource not found.".to_owned())
    }

    /// Not-found with a precondition- or resource-specific message.
    pub fn not_found_because(message: impl Into<String>) -> Self {
        Outcome::NotFound(message.into())
    }

    pub(crate) fn into_parts(self) -> (Status, Option<Value>) {
        match self {
            Outcome::Ok(value) => (Status::Ok, Some(value)),
            Outcome::NoContent => (Status::NoContent, None),
            Outcome::BadRequest(message) => {
                (Status::BadRequest, Some(json!({ "message": message })))
            }
            Outcome::NotFound(message) => (Status::NotFound, Some(json!({ "message": message }))),
            Outcome::MethodNotAllowed => (
                Status::MethodNotAllowed,
                Some(json!({
                    "message": "The request method is not allowed for the target URI."
                })),
            ),
            Outcome::PayloadTooLarge => (
                Status::PayloadTooLarge,
                Some(json!({ "message": "Request content is too large." })),
            ),
            Outcome::Internal => (
                Status::InternalServerError,
                Some(json!({ "message": "Unable to build the response." })),
            ),
        }
    }
}

// WRITER

/// Encodes a status and optional JSON payload as one complete HTTP/1.0
/// response. Exchanges are one-shot, so the connection always closes.
pub(crate) fn encode(status: Status, body: Option<&Value>) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(256);
    buffer.extend_from_slice(status.line().as_bytes());

    match body.map(Value::to_string) {
        Some(body) => {
            buffer.extend_from_slice(b"content-type: application/json\r\n");
            buffer.extend_from_slice(format!("content-length: {}\r\n", body.len()).as_bytes());
            buffer.extend_from_slice(b"connection: close\r\n\r\n");
            buffer.extend_from_slice(body.as_bytes());
        }
        None => {
            buffer.extend_from_slice(b"content-length: 0\r\nconnection: close\r\n\r\n");
        }
    }

    buffer
}

/// Serializes an outcome onto the exchange's output sink. Called exactly
/// once per dispatched request.
pub(crate) fn write(outcome: Outcome, exchange: &mut dyn Exchange) -> io::Result<()> {
    let (status, body) = outcome.into_parts();
    exchange.send(&encode(status, body.as_ref()))
}
