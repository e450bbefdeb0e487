//! The `/console` resource: the log buffer and direct command entry.

use super::router::{required_string, FieldFilter, RequestCx, Resource};
use crate::http::{request::Method, response::Outcome};
use serde_json::json;

// a console command is a command line already; only line breaks could
// smuggle in a second one
const COMMAND_FILTER: FieldFilter = FieldFilter::deny(&['\n', '\r']);

pub(crate) struct ConsoleResource;

impl Resource for ConsoleResource {
    fn handle(&self, cx: &mut RequestCx<'_>) -> Outcome {
        if cx.req.segments().len() != 1 {
            return Outcome::not_found();
        }

        match cx.req.method() {
            Method::Get => Outcome::Ok(json!({ "text": cx.game.console_text() })),
            Method::Post => execute(cx),
            _ => Outcome::MethodNotAllowed,
        }
    }
}

// POST /console
fn execute(cx: &mut RequestCx<'_>) -> Outcome {
    let command = match required_string(&mut cx.body, "command", &COMMAND_FILTER) {
        Ok(command) => command,
        Err(outcome) => return outcome,
    };

    cx.game.enqueue_command(&command);
    Outcome::NoContent
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{dispatch, running_game};
    use crate::http::response::Status;

    #[test]
    fn returns_the_log_buffer() {
        let mut game = running_game();
        game.console = "]map mp/ffa1\nloading...\n".to_owned();

        let (status, body) = dispatch(&mut game, "GET", "/console", b"");
        assert_eq!(status, Status::Ok);
        assert_eq!(body.unwrap()["text"], "]map mp/ffa1\nloading...\n");
    }

    #[test]
    fn executes_a_command_line() {
        let mut game = running_game();
        let (status, _) = dispatch(
            &mut game,
            "POST",
            "/console",
            br#"{"command":"status"}"#,
        );

        assert_eq!(status, Status::NoContent);
        assert_eq!(game.commands, ["status"]);
    }

    #[test]
    fn rejects_line_breaks_but_not_semicolons() {
        let mut game = running_game();

        let (status, _) = dispatch(
            &mut game,
            "POST",
            "/console",
            b"{\"command\":\"status\\nquit\"}",
        );
        assert_eq!(status, Status::BadRequest);
        assert!(game.commands.is_empty());

        // the console's own separator is fair game here
        let (status, _) = dispatch(
            &mut game,
            "POST",
            "/console",
            br#"{"command":"status; meminfo"}"#,
        );
        assert_eq!(status, Status::NoContent);
        assert_eq!(game.commands, ["status; meminfo"]);
    }

    #[test]
    fn requires_the_command_field() {
        let mut game = running_game();
        let (status, body) = dispatch(&mut game, "POST", "/console", br#"{"cmd":"x"}"#);

        assert_eq!(status, Status::BadRequest);
        assert_eq!(
            body.unwrap()["message"],
            "You must provide a string 'command' field in the request content."
        );
    }

    #[test]
    fn no_sub_resources() {
        let mut game = running_game();
        let (status, _) = dispatch(&mut game, "GET", "/console/history", b"");
        assert_eq!(status, Status::NotFound);
    }
}
