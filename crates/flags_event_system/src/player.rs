//! Player session contract.

use crate::{Location, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

/// Why a player was teleported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeleportCause {
    /// Moved by a module
    Plugin,
    /// Moved by a command
    Command,
    Unknown,
}

/// A sound cue played at a location for a single player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    /// Host sound identifier, e.g. `note.piano`
    pub key: String,
    pub volume: f32,
    pub pitch: f32,
}

impl Sound {
    pub fn new(key: impl Into<String>, volume: f32, pitch: f32) -> Self {
        Self {
            key: key.into(),
            volume,
            pitch,
        }
    }
}

/// A connected player.
///
/// Implementations are shared across handlers and scheduled tasks, so every
/// mutating operation takes `&self`.
pub trait Player: Send + Sync {
    fn id(&self) -> PlayerId;

    /// Account name, used for ownership and trust lookups.
    fn name(&self) -> &str;

    fn display_name(&self) -> String {
        self.name().to_string()
    }

    fn has_permission(&self, permission: &str) -> bool;

    fn send_message(&self, message: &str);

    /// Whether the player may toggle flight.
    fn allow_flight(&self) -> bool;
    fn set_allow_flight(&self, allow: bool);

    fn is_flying(&self) -> bool;
    fn set_flying(&self, flying: bool);

    fn game_mode(&self) -> GameMode;

    fn location(&self) -> Location;

    /// Moves the player. Returns false if the host refused the teleport.
    fn teleport(&self, destination: Location, cause: TeleportCause) -> bool;

    fn play_sound(&self, location: &Location, sound: &Sound);

    fn is_online(&self) -> bool;
}
