//! The simulation-side surface the admin API reads from and commands.
//!
//! Handlers run on the simulation thread, so every call here is a plain
//! synchronous borrow; mutation happens exclusively through
//! [`GameServer::enqueue_command`], which feeds the same console command
//! queue an operator at the terminal would.

use std::time::Duration;

/// Read access to live server state plus the console command queue.
///
/// Implemented by the embedding game server; the API never caches any of
/// these answers across ticks.
pub trait GameServer {
    /// Whether a level is loaded and the simulation is ticking. Most
    /// operations refuse to run while this is `false`.
    fn is_running(&self) -> bool;

    /// The operator-configured server name.
    fn host_name(&self) -> String;

    /// The short name of the loaded level, if one is loaded.
    fn current_level(&self) -> Option<String>;

    /// Short names of every level available to load.
    fn levels(&self) -> Vec<String>;

    /// The configured player slot count.
    fn max_players(&self) -> usize;

    /// The player occupying `slot`, if any.
    fn player(&self, slot: usize) -> Option<PlayerInfo>;

    /// The active rule set.
    fn game_mode(&self) -> GameMode;

    /// Time since the server process came up.
    fn uptime(&self) -> Duration;

    /// The address remote clients connect to.
    fn public_address(&self) -> String;

    /// The accumulated console log.
    fn console_text(&self) -> String;

    /// The product name, e.g. for a landing banner.
    fn title(&self) -> String;

    /// The product version string.
    fn version(&self) -> String;

    /// Appends one line to the console command queue. The line is
    /// executed by the simulation on a later tick, never immediately.
    fn enqueue_command(&mut self, line: &str);
}

/// Snapshot of one occupied player slot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    /// Display name, colour codes included.
    pub name: String,
    /// Time since the player entered the current level.
    pub playing_time: Duration,
    /// Current score.
    pub score: i32,
    /// Slot is filled by a bot.
    pub is_bot: bool,
    /// Player is connected from the server's own machine.
    pub is_local: bool,
}

/// The rule sets a level can be played under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    FreeForAll,
    Duel,
    TeamDeathmatch,
    CaptureTheFlag,
}

impl GameMode {
    /// Looks up a mode from its numeric wire id.
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(GameMode::FreeForAll),
            1 => Some(GameMode::Duel),
            2 => Some(GameMode::TeamDeathmatch),
            3 => Some(GameMode::CaptureTheFlag),
            _ => None,
        }
    }

    /// The numeric id understood by the console `g_gametype` variable.
    pub const fn id(&self) -> u32 {
        match self {
            GameMode::FreeForAll => 0,
            GameMode::Duel => 1,
            GameMode::TeamDeathmatch => 2,
            GameMode::CaptureTheFlag => 3,
        }
    }

    /// Human-readable mode name, as shown in server listings.
    pub const fn as_str(&self) -> &'static str {
        match self {
            GameMode::FreeForAll => "Free For All",
            GameMode::Duel => "Duel",
            GameMode::TeamDeathmatch => "Team Deathmatch",
            GameMode::CaptureTheFlag => "Capture The Flag",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_ids_round_trip() {
        for id in 0..4 {
            assert_eq!(GameMode::from_id(id).unwrap().id(), id);
        }
        assert_eq!(GameMode::from_id(4), None);
    }

    #[test]
    fn mode_names() {
        assert_eq!(GameMode::FreeForAll.as_str(), "Free For All");
        assert_eq!(GameMode::CaptureTheFlag.as_str(), "Capture The Flag");
    }
}
