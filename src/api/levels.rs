//! The `/levels` resource: the catalogue of loadable levels.

use super::router::{RequestCx, Resource};
use crate::http::{request::Method, response::Outcome};

pub(crate) struct LevelsResource;

impl Resource for LevelsResource {
    fn handle(&self, cx: &mut RequestCx<'_>) -> Outcome {
        if cx.req.segments().len() != 1 {
            return Outcome::not_found();
        }
        if cx.req.method() != Method::Get {
            return Outcome::MethodNotAllowed;
        }

        // the catalogue comes from installed assets, not the live
        // simulation, so no running precondition applies
        Outcome::ok(&cx.game.levels())
    }
}
