//! The `/players` resource: slot listings and per-player moderation.

use super::router::{body_outcome, FieldFilter, RequestCx, Resource};
use crate::{
    game::{GameServer, PlayerInfo},
    http::{request::Method, response::Outcome},
};
use serde::Serialize;

// a kick/ban reason lands inside a quoted command argument
const REASON_FILTER: FieldFilter = FieldFilter::deny(&['\n', '\r', ';', '"', '/', '*']);

pub(crate) struct PlayersResource;

impl Resource for PlayersResource {
    fn handle(&self, cx: &mut RequestCx<'_>) -> Outcome {
        // every player route reads the live player table; without a
        // running server the whole subtree does not exist
        if !cx.game.is_running() {
            return Outcome::not_found_because("Server is not running.");
        }

        match cx.req.segments().len() {
            1 => match cx.req.method() {
                Method::Get => list(cx.game),
                _ => Outcome::MethodNotAllowed,
            },
            2 => match cx.req.method() {
                Method::Get => single(cx),
                _ => Outcome::MethodNotAllowed,
            },
            3 => action(cx),
            _ => Outcome::not_found(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerView {
    id: usize,
    name: String,
    playing_time: f64,
    score: i32,
    is_bot: bool,
    is_local: bool,
}

impl PlayerView {
    fn new(slot: usize, info: PlayerInfo) -> Self {
        Self {
            id: slot,
            name: info.name,
            playing_time: info.playing_time.as_secs_f64(),
            score: info.score,
            is_bot: info.is_bot,
            is_local: info.is_local,
        }
    }
}

// GET /players
fn list(game: &dyn GameServer) -> Outcome {
    let players: Vec<PlayerView> = (0..game.max_players())
        .filter_map(|slot| game.player(slot).map(|info| PlayerView::new(slot, info)))
        .collect();

    Outcome::ok(&players)
}

// GET /players/{id}
fn single(cx: &mut RequestCx<'_>) -> Outcome {
    let slot = match parse_slot(cx) {
        Ok(slot) => slot,
        Err(outcome) => return outcome,
    };

    match cx.game.player(slot) {
        Some(info) => Outcome::ok(&PlayerView::new(slot, info)),
        None => Outcome::not_found_because("Player not found."),
    }
}

// POST /players/{id}/kick, POST /players/{id}/ban
fn action(cx: &mut RequestCx<'_>) -> Outcome {
    let command = match cx.req.segment(2) {
        Some("kick") => "clientkick",
        Some("ban") => "banclient",
        _ => return Outcome::not_found(),
    };
    if cx.req.method() != Method::Post {
        return Outcome::MethodNotAllowed;
    }

    let slot = match parse_slot(cx) {
        Ok(slot) => slot,
        Err(outcome) => return outcome,
    };
    if cx.game.player(slot).is_none() {
        return Outcome::not_found_because("Player not found.");
    }

    // the reason is optional, but when given it must be a clean string
    let reason = match cx.body.read_json_optional() {
        Ok(body) => match body.as_ref().and_then(|value| value.get("reason")) {
            None => None,
            Some(value) => match value.as_str() {
                Some(reason) if REASON_FILTER.accepts(reason) => Some(reason.to_owned()),
                Some(_) => {
                    return Outcome::bad_request("Invalid characters in the 'reason' field.")
                }
                None => {
                    return Outcome::bad_request(
                        "You must provide a string 'reason' field in the request content.",
                    )
                }
            },
        },
        Err(err) => return body_outcome(err),
    };

    match reason {
        Some(reason) => cx
            .game
            .enqueue_command(&format!("{command} {slot} \"{reason}\"")),
        None => cx.game.enqueue_command(&format!("{command} {slot}")),
    }

    Outcome::NoContent
}

fn parse_slot(cx: &RequestCx<'_>) -> Result<usize, Outcome> {
    let raw = cx.req.segment(1).unwrap_or("");
    let slot: usize = raw
        .parse()
        .map_err(|_| Outcome::bad_request("The player id must be an integer."))?;

    if slot >= cx.game.max_players() {
        return Err(Outcome::not_found_because("Player not found."));
    }
    Ok(slot)
}
