//! A toy game server with an in-memory player table, wired to the admin
//! API. Run it and poke the endpoints:
//!
//! ```text
//! cargo run --example in_memory
//! curl http://127.0.0.1:8080/server
//! curl http://127.0.0.1:8080/players
//! curl -X POST -d '{"message":"hello"}' http://127.0.0.1:8080/server/broadcast
//! curl -X POST http://127.0.0.1:8080/server/shutdown
//! ```

use std::{
    mem,
    thread,
    time::{Duration, Instant},
};
use webrcon::{ApiLimits, GameMode, GameServer, PlayerInfo, WebRcon};

struct InMemoryGame {
    started: Instant,
    running: bool,
    players: Vec<Option<PlayerInfo>>,
    level: String,
    console: String,
    pending: Vec<String>,
}

impl InMemoryGame {
    fn new() -> Self {
        let mut players = vec![None; 16];
        players[0] = Some(PlayerInfo {
            name: "Padawan".to_owned(),
            playing_time: Duration::from_secs(0),
            score: 0,
            is_bot: false,
            is_local: true,
        });

        Self {
            started: Instant::now(),
            running: true,
            players,
            level: "mp/ffa1".to_owned(),
            console: String::new(),
            pending: Vec::new(),
        }
    }

    /// Stand-in for the real command interpreter: log every line and
    /// honor the one command the demo loop cares about.
    fn run_pending_commands(&mut self) {
        for line in mem::take(&mut self.pending) {
            println!("executing: {line}");
            self.console.push_str(&format!("]{line}\n"));
            if line == "killserver" {
                self.running = false;
            }
        }
    }
}

impl GameServer for InMemoryGame {
    fn is_running(&self) -> bool {
        self.running
    }

    fn host_name(&self) -> String {
        "In-Memory Demo Server".to_owned()
    }

    fn current_level(&self) -> Option<String> {
        self.running.then(|| self.level.clone())
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
        self.started.elapsed()
    }

    fn public_address(&self) -> String {
        "127.0.0.1:29070".to_owned()
    }

    fn console_text(&self) -> String {
        self.console.clone()
    }

    fn title(&self) -> String {
        "In-Memory Demo".to_owned()
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_owned()
    }

    fn enqueue_command(&mut self, line: &str) {
        self.pending.push(line.to_owned());
    }
}

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut game = InMemoryGame::new();
    let mut api = WebRcon::bind("127.0.0.1:8080".parse().unwrap(), ApiLimits::default())?;
    println!("admin API on http://{}", api.local_addr());

    // the simulation tick, at roughly 100 Hz
    while game.running {
        api.frame(&mut game);
        game.run_pending_commands();
        thread::sleep(Duration::from_millis(10));
    }

    println!("killserver received, shutting down");
    api.shutdown();
    Ok(())
}
