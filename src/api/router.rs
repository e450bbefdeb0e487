//! Maps a validated request onto exactly one resource handler.

use crate::{
    game::GameServer,
    http::{
        request::{BodyError, BodyReader, ParsedRequest},
        response::Outcome,
    },
};
use serde_json::Value;
use std::io;

/// Everything a resource handler may touch while serving one request.
pub(crate) struct RequestCx<'a> {
    pub(crate) req: &'a ParsedRequest,
    pub(crate) body: BodyReader<'a>,
    pub(crate) game: &'a mut dyn GameServer,
}

/// One addressable resource under a fixed root path segment.
pub(crate) trait Resource: Send + Sync {
    fn handle(&self, cx: &mut RequestCx<'_>) -> Outcome;
}

/// The fixed resource table, keyed by first path segment.
pub(crate) struct Router {
    routes: Vec<(&'static str, Box<dyn Resource>)>,
}

impl Router {
    pub(crate) fn new() -> Self {
        Self {
            routes: vec![
                ("server", Box::new(super::server::ServerResource)),
                ("players", Box::new(super::players::PlayersResource)),
                ("levels", Box::new(super::levels::LevelsResource)),
                ("console", Box::new(super::console::ConsoleResource)),
            ],
        }
    }

    /// Hands the request to the resource owning its root segment.
    ///
    /// A missing or unrecognized root segment is a plain not-found; only
    /// a recognized resource gets to distinguish wrong-method from
    /// missing-subresource.
    pub(crate) fn dispatch(&self, cx: &mut RequestCx<'_>) -> Outcome {
        let Some(root) = cx.req.segment(0) else {
            return Outcome::not_found();
        };

        match self.routes.iter().find(|(name, _)| *name == root) {
            Some((_, resource)) => resource.handle(cx),
            None => Outcome::not_found(),
        }
    }
}

// FIELD HELPERS

/// Characters a handler refuses to pass into its command sublanguage.
///
/// The denied set is per action; a string destined for a quoted chat
/// message has different metacharacters than one destined for a level
/// name.
pub(crate) struct FieldFilter {
    denied: &'static [char],
}

impl FieldFilter {
    pub(crate) const fn deny(denied: &'static [char]) -> Self {
        Self { denied }
    }

    pub(crate) fn accepts(&self, text: &str) -> bool {
        !text.contains(self.denied)
    }
}

/// Maps a body-read failure onto its response outcome.
pub(crate) fn body_outcome(err: BodyError) -> Outcome {
    match err {
        BodyError::TooLarge => Outcome::PayloadTooLarge,
        // a client that declared a body and stalled sending it hit the
        // read deadline; that is its fault, not ours
        BodyError::Io(err)
            if matches!(
                err.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ) =>
        {
            Outcome::bad_request("Unable to read the request content.")
        }
        BodyError::Io(err) => {
            tracing::error!(error = %err, "transport failed while reading a request body");
            Outcome::Internal
        }
        other => Outcome::bad_request(other.to_string()),
    }
}

/// Reads the body and extracts one required, filtered string field.
pub(crate) fn required_string(
    body: &mut BodyReader<'_>,
    field: &'static str,
    filter: &FieldFilter,
) -> Result<String, Outcome> {
    let value = body.read_json().map_err(body_outcome)?;

    let Some(text) = value.get(field).and_then(Value::as_str) else {
        return Err(Outcome::bad_request(format!(
            "You must provide a string '{field}' field in the request content."
        )));
    };
    if !filter.accepts(text) {
        return Err(Outcome::bad_request(format!(
            "Invalid characters in the '{field}' field."
        )));
    }

    Ok(text.to_owned())
}
