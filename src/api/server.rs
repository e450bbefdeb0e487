//! The `/server` resource: status projection and process-level actions.

use super::router::{body_outcome, required_string, FieldFilter, RequestCx, Resource};
use crate::{
    game::{GameMode, GameServer},
    http::{request::Method, response::Outcome},
};
use serde::Serialize;
use serde_json::Value;

// a broadcast lands inside a quoted chat command
const MESSAGE_FILTER: FieldFilter = FieldFilter::deny(&['\n', '\r', ';', '"', '/', '*']);
// a level name lands inside a quoted map command; slashes are legal there
const LEVEL_FILTER: FieldFilter = FieldFilter::deny(&['\n', '\r', ';', '"', '*', ':']);

pub(crate) struct ServerResource;

impl Resource for ServerResource {
    fn handle(&self, cx: &mut RequestCx<'_>) -> Outcome {
        match (cx.req.segments().len(), cx.req.segment(1)) {
            (1, _) => match cx.req.method() {
                Method::Get => status(cx.game),
                _ => Outcome::MethodNotAllowed,
            },
            (2, Some(action @ ("restart" | "shutdown" | "broadcast" | "level" | "gamemode"))) => {
                if cx.req.method() != Method::Post {
                    return Outcome::MethodNotAllowed;
                }
                match action {
                    "restart" => restart(cx.game),
                    "shutdown" => shutdown(cx.game),
                    "broadcast" => broadcast(cx),
                    "level" => level(cx),
                    _ => gamemode(cx),
                }
            }
            _ => Outcome::not_found(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerView {
    state: &'static str,
    name: String,
    max_players: usize,
    num_players: usize,
    game_mode: &'static str,
    uptime: f64,
    address: String,
    game: String,
    version: String,
    platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    map_name: Option<String>,
}

// GET /server
fn status(game: &dyn GameServer) -> Outcome {
    let running = game.is_running();

    let num_players = if running {
        (0..game.max_players())
            .filter(|slot| game.player(*slot).is_some())
            .count()
    } else {
        0
    };

    Outcome::ok(&ServerView {
        state: if running { "online" } else { "offline" },
        name: game.host_name(),
        max_players: game.max_players(),
        num_players,
        game_mode: game.game_mode().as_str(),
        uptime: game.uptime().as_secs_f64(),
        address: game.public_address(),
        game: game.title(),
        version: game.version(),
        platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
        // only meaningful while a level is actually loaded
        map_name: if running { game.current_level() } else { None },
    })
}

// POST /server/restart
fn restart(game: &mut dyn GameServer) -> Outcome {
    // without a running level there is nothing to load again
    let Some(level) = game.current_level().filter(|_| game.is_running()) else {
        return Outcome::not_found_because("Server is not running.");
    };

    game.enqueue_command(&format!("map {level}"));
    Outcome::NoContent
}

// POST /server/shutdown
fn shutdown(game: &mut dyn GameServer) -> Outcome {
    // stopping an already-stopped server is a no-op, not an error
    if game.is_running() {
        game.enqueue_command("killserver");
    }
    Outcome::NoContent
}

// POST /server/broadcast
fn broadcast(cx: &mut RequestCx<'_>) -> Outcome {
    if !cx.game.is_running() {
        return Outcome::not_found_because("Server is not running.");
    }

    let message = match required_string(&mut cx.body, "message", &MESSAGE_FILTER) {
        Ok(message) => message,
        Err(outcome) => return outcome,
    };

    cx.game.enqueue_command(&format!("svsay \"{message}\""));
    Outcome::NoContent
}

// POST /server/level
fn level(cx: &mut RequestCx<'_>) -> Outcome {
    let level = match required_string(&mut cx.body, "level", &LEVEL_FILTER) {
        Ok(level) => level,
        Err(outcome) => return outcome,
    };

    cx.game.enqueue_command(&format!("map \"{level}\""));
    Outcome::NoContent
}

// POST /server/gamemode
fn gamemode(cx: &mut RequestCx<'_>) -> Outcome {
    let value = match cx.body.read_json() {
        Ok(value) => value,
        Err(err) => return body_outcome(err),
    };

    let Some(raw) = value.get("gameMode").and_then(Value::as_str) else {
        return Outcome::bad_request(
            "You must provide a string 'gameMode' field in the request content.",
        );
    };
    let Some(mode) = raw.parse().ok().and_then(GameMode::from_id) else {
        return Outcome::not_found_because("Invalid game mode chosen.");
    };

    cx.game.enqueue_command(&format!("set g_gametype {}", mode.id()));
    // reload the current level so the new rule set takes effect
    if let Some(level) = cx.game.current_level() {
        cx.game.enqueue_command(&format!("map {level}"));
    }

    Outcome::NoContent
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{dispatch, offline_game, running_game};
    use crate::http::response::Status;

    #[test]
    fn status_reflects_running_state() {
        let mut game = running_game();
        let (status, body) = dispatch(&mut game, "GET", "/server", b"");

        assert_eq!(status, Status::Ok);
        let body = body.unwrap();
        assert_eq!(body["state"], "online");
        assert_eq!(body["numPlayers"], 2);
        assert_eq!(body["maxPlayers"], 16);
        assert_eq!(body["mapName"], "mp/ffa1");
        assert_eq!(body["gameMode"], "Free For All");
        assert!(body["platform"].is_string());
    }

    #[test]
    fn offline_status_has_no_map() {
        let mut game = offline_game();
        let (status, body) = dispatch(&mut game, "GET", "/server", b"");

        assert_eq!(status, Status::Ok);
        let body = body.unwrap();
        assert_eq!(body["state"], "offline");
        assert_eq!(body["numPlayers"], 0);
        assert!(body.get("mapName").is_none());
    }

    #[test]
    fn status_is_get_only() {
        let mut game = running_game();
        let (status, _) = dispatch(&mut game, "POST", "/server", b"");
        assert_eq!(status, Status::MethodNotAllowed);
    }

    #[test]
    fn restart_reloads_the_current_level() {
        let mut game = running_game();
        let (status, _) = dispatch(&mut game, "POST", "/server/restart", b"");

        assert_eq!(status, Status::NoContent);
        assert_eq!(game.commands, ["map mp/ffa1"]);
    }

    #[test]
    fn restart_needs_a_running_server() {
        let mut game = offline_game();
        let (status, body) = dispatch(&mut game, "POST", "/server/restart", b"");

        assert_eq!(status, Status::NotFound);
        assert_eq!(body.unwrap()["message"], "Server is not running.");
        assert!(game.commands.is_empty());
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut game = running_game();
        let (status, _) = dispatch(&mut game, "POST", "/server/shutdown", b"");
        assert_eq!(status, Status::NoContent);
        assert_eq!(game.commands, ["killserver"]);

        let mut game = offline_game();
        let (status, _) = dispatch(&mut game, "POST", "/server/shutdown", b"");
        assert_eq!(status, Status::NoContent);
        assert!(game.commands.is_empty());
    }

    #[test]
    fn broadcast_quotes_the_message() {
        let mut game = running_game();
        let (status, _) = dispatch(
            &mut game,
            "POST",
            "/server/broadcast",
            br#"{"message":"hello there"}"#,
        );

        assert_eq!(status, Status::NoContent);
        assert_eq!(game.commands, ["svsay \"hello there\""]);
    }

    #[test]
    fn broadcast_rejects_command_metacharacters() {
        let mut game = running_game();
        let (status, body) = dispatch(
            &mut game,
            "POST",
            "/server/broadcast",
            br#"{"message":"hi;there"}"#,
        );

        assert_eq!(status, Status::BadRequest);
        assert_eq!(
            body.unwrap()["message"],
            "Invalid characters in the 'message' field."
        );
        assert!(game.commands.is_empty());
    }

    #[test]
    fn broadcast_requires_the_message_field() {
        let mut game = running_game();
        let (status, body) = dispatch(&mut game, "POST", "/server/broadcast", br#"{"msg":"x"}"#);

        assert_eq!(status, Status::BadRequest);
        assert_eq!(
            body.unwrap()["message"],
            "You must provide a string 'message' field in the request content."
        );
    }

    #[test]
    fn level_change_allows_slashes() {
        let mut game = running_game();
        let (status, _) = dispatch(
            &mut game,
            "POST",
            "/server/level",
            br#"{"level":"mp/duel1"}"#,
        );

        assert_eq!(status, Status::NoContent);
        assert_eq!(game.commands, ["map \"mp/duel1\""]);
    }

    #[test]
    fn level_change_rejects_colons() {
        let mut game = running_game();
        let (status, _) = dispatch(
            &mut game,
            "POST",
            "/server/level",
            br#"{"level":"mp:duel1"}"#,
        );

        assert_eq!(status, Status::BadRequest);
        assert!(game.commands.is_empty());
    }

    #[test]
    fn gamemode_change_reloads_the_level() {
        let mut game = running_game();
        let (status, _) = dispatch(
            &mut game,
            "POST",
            "/server/gamemode",
            br#"{"gameMode":"3"}"#,
        );

        assert_eq!(status, Status::NoContent);
        assert_eq!(game.commands, ["set g_gametype 3", "map mp/ffa1"]);
    }

    #[test]
    fn unknown_gamemode_rejected() {
        let mut game = running_game();
        let (status, body) = dispatch(
            &mut game,
            "POST",
            "/server/gamemode",
            br#"{"gameMode":"99"}"#,
        );

        assert_eq!(status, Status::NotFound);
        assert_eq!(body.unwrap()["message"], "Invalid game mode chosen.");
    }

    #[test]
    fn unknown_action_is_not_found() {
        let mut game = running_game();
        let (status, _) = dispatch(&mut game, "POST", "/server/explode", b"");
        assert_eq!(status, Status::NotFound);

        let (status, _) = dispatch(&mut game, "POST", "/server/restart/now", b"");
        assert_eq!(status, Status::NotFound);
    }
}
