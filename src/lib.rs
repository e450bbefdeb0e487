//! # webrcon
//!
//! An embeddable web administration API for game servers that run a
//! single-threaded simulation loop.
//!
//! The service listens for one-shot HTTP/1.0 requests on a dedicated
//! accept thread, but never touches game state from it. Each request is
//! handed through a single-slot rendezvous to the simulation thread,
//! which polls for it once per tick, serves it against live state, and
//! releases the accept thread to take the next connection. At most one
//! request is in flight at any time, so resource handlers read the
//! player table, cvars, and level state without any locking.
//!
//! Resources are fixed: `/server` (status and control actions),
//! `/players` (listings and moderation), `/levels` (the level
//! catalogue), and `/console` (log buffer and command entry). Payloads
//! are JSON both ways; every error carries `{ "message": ... }`.
//!
//! ## Usage
//!
//! Implement [`GameServer`] over your simulation state, then drive
//! [`WebRcon::frame`] from the tick loop:
//!
//! ```no_run
//! use webrcon::{ApiLimits, WebRcon};
//! # struct Sim;
//! # impl Sim { fn tick(&mut self) -> bool { false } fn game(&mut self) -> &mut dyn webrcon::GameServer { unimplemented!() } }
//! # fn main() -> std::io::Result<()> {
//! # let mut sim = Sim;
//! let mut api = WebRcon::bind("127.0.0.1:8080".parse().unwrap(), ApiLimits::default())?;
//!
//! while sim.tick() {
//!     api.frame(sim.game());
//! }
//! api.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! Mutating actions are fire-and-forget: a `204 No Content` means the
//! command was appended to the console queue, not that it has run.

pub(crate) mod api {
    pub(crate) mod console;
    pub(crate) mod levels;
    pub(crate) mod players;
    pub(crate) mod router;
    pub(crate) mod server;
    #[cfg(test)]
    pub(crate) mod testing;
}

pub mod game;

pub(crate) mod http {
    pub mod path;
    pub mod query;
    pub mod request;
    pub mod response;
}

mod limits;

pub(crate) mod server {
    pub(crate) mod handoff;
    pub(crate) mod service;
    pub(crate) mod transport;
}

pub use crate::game::{GameMode, GameServer, PlayerInfo};
pub use crate::http::{path, query};
pub use crate::http::request::{Method, ParsedRequest};
pub use crate::http::response::{Outcome, Status};
pub use crate::limits::ApiLimits;
pub use crate::server::service::WebRcon;
