//! Shared fixtures for the resource handler tests.

use super::router::{RequestCx, Router};
use crate::{
    game::{GameMode, GameServer, PlayerInfo},
    http::{
        request::{BodyReader, ParsedRequest},
        response::Status,
    },
    server::transport::testing::StaticExchange,
};
use serde_json::Value;
use std::time::Duration;

/// Scriptable stand-in for the simulation, recording enqueued commands.
pub(crate) struct MockGame {
    pub(crate) running: bool,
    pub(crate) players: Vec<Option<PlayerInfo>>,
    pub(crate) level: Option<String>,
    pub(crate) console: String,
    pub(crate) commands: Vec<String>,
}

impl GameServer for MockGame {
    fn is_running(&self) -> bool {
        self.running
    }

    fn host_name(&self) -> String {
        "Test Server".to_owned()
    }

    fn current_level(&self) -> Option<String> {
        self.level.clone()
    }

    fn levels(&self) -> Vec<String> {
        ["mp/ffa1", "mp/duel1", "mp/ctf1"]
            .map(str::to_owned)
            .to_vec()
    }

    fn max_players(&self) -> usize {
        self.players.len()
    }

    fn player(&self, slot: usize) -> Option<PlayerInfo> {
        self.players.get(slot).cloned().flatten()
    }

    fn game_mode(&self) -> GameMode {
        GameMode::FreeForAll
    }

    fn uptime(&self) -> Duration {
        Duration::from_secs(600)
    }

    fn public_address(&self) -> String {
        "203.0.113.1:29070".to_owned()
    }

    fn console_text(&self) -> String {
        self.console.clone()
    }

    fn title(&self) -> String {
        "Test Game".to_owned()
    }

    fn version(&self) -> String {
        "1.0.1".to_owned()
    }

    fn enqueue_command(&mut self, line: &str) {
        self.commands.push(line.to_owned());
    }
}

/// A 16-slot running server with a human in slot 0 and a bot in slot 4.
pub(crate) fn running_game() -> MockGame {
    let mut players = vec![None; 16];
    players[0] = Some(PlayerInfo {
        name: "Padawan".to_owned(),
        playing_time: Duration::from_secs(90),
        score: 7,
        is_bot: false,
        is_local: false,
    });
    players[4] = Some(PlayerInfo {
        name: "Kyle".to_owned(),
        playing_time: Duration::from_secs(600),
        score: 12,
        is_bot: true,
        is_local: true,
    });

    MockGame {
        running: true,
        players,
        level: Some("mp/ffa1".to_owned()),
        console: String::new(),
        commands: Vec::new(),
    }
}

/// A server that has not loaded a level.
pub(crate) fn offline_game() -> MockGame {
    MockGame {
        running: false,
        players: vec![None; 16],
        level: None,
        console: String::new(),
        commands: Vec::new(),
    }
}

/// Parses `target`, routes it against `game`, and returns the outcome
/// as status and decoded payload.
pub(crate) fn dispatch(
    game: &mut MockGame,
    method: &str,
    target: &str,
    body: &[u8],
) -> (Status, Option<Value>) {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let req = ParsedRequest::parse(method, path, query).expect("well-formed test request");

    let mut exchange = StaticExchange::with_body(body);
    let mut cx = RequestCx {
        req: &req,
        body: BodyReader::new(&mut exchange, 1024),
        game,
    };

    Router::new().dispatch(&mut cx).into_parts()
}
