//! Event type definitions for the session log

use serde::{Deserialize, Serialize};

/// Run configuration snapshot logged once per session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub level: String,
    pub loop_duration: f32,
    pub max_loops: usize,
    pub game_ends_after_max_loops: bool,
    pub ghost_mode: String,
    pub teleport_threshold: f32,
    pub correction_threshold: f32,
    pub fidelity_gain: f32,
}

/// All events that cross module boundaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    // === Session Events ===
    /// Session started (generated once per game launch)
    SessionStart {
        session_id: String, // UUID v4
        timestamp: String,
    },
    /// Configuration snapshot (logged after session start)
    Config(GameConfig),

    // === Loop Events ===
    /// A loop began with this many ghosts replaying
    LoopStart { loop_index: usize, ghosts: usize },
    /// A loop finished and its recording was stored
    LoopEnd { loop_index: usize, samples: usize },
    /// Final loop finished; waiting for a reset
    GameOver { loops: usize },
    /// Store cleared and loop index back to zero
    RunReset,
    /// A loop could not start
    ConfigError { message: String },
    /// Seconds added to the running loop
    AddTime { seconds: f32 },

    // === Ghost Events ===
    /// Ghost collided hard enough to show an effect
    GhostImpact {
        ghost: usize,
        pos: (f32, f32),
        speed: f32,
    },
    /// Ghost fell out of the world and was deactivated
    GhostLost { ghost: usize },

    // === Player Events ===
    Pickup,
    Drop,
    Jump,
    Land,

    // === Puzzle Events ===
    PlatePressed { plate: u32 },
    PlateReleased { plate: u32 },
    DoorOpened { door: u32 },
    DoorClosed { door: u32 },
}

impl GameEvent {
    /// Get the event type code for compact serialization
    pub fn type_code(&self) -> &'static str {
        match self {
            GameEvent::SessionStart { .. } => "SE",
            GameEvent::Config(_) => "CF",
            GameEvent::LoopStart { .. } => "LS",
            GameEvent::LoopEnd { .. } => "LE",
            GameEvent::GameOver { .. } => "GO",
            GameEvent::RunReset => "RR",
            GameEvent::ConfigError { .. } => "CE",
            GameEvent::AddTime { .. } => "AT",
            GameEvent::GhostImpact { .. } => "GI",
            GameEvent::GhostLost { .. } => "GL",
            GameEvent::Pickup => "PU",
            GameEvent::Drop => "DR",
            GameEvent::Jump => "J",
            GameEvent::Land => "LD",
            GameEvent::PlatePressed { .. } => "P+",
            GameEvent::PlateReleased { .. } => "P-",
            GameEvent::DoorOpened { .. } => "D+",
            GameEvent::DoorClosed { .. } => "D-",
        }
    }
}
