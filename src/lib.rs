//! Timeloop - a puzzle platformer built with Bevy where every past loop
//! replays as a ghost that still takes part in physics.
//!
//! This crate provides all game components, resources, and systems organized into modules.

// Core modules
pub mod config_watcher;
pub mod constants;
pub mod events;
pub mod helpers;
pub mod settings;
pub mod simulation;
pub mod tick;
pub mod tuning;

// Game logic modules
pub mod ghost;
pub mod input;
pub mod levels;
pub mod loops;
pub mod player;
pub mod puzzle;
pub mod recording;
pub mod ui;
pub mod world;

// Re-export commonly used types for convenience
pub use config_watcher::ConfigWatcher;
pub use events::{BusEvent, EventBuffer, EventBus, GameConfig, GameEvent};
pub use ghost::{Ghost, GhostPose, GhostReplay, ReconcileMode};
pub use input::PlayerInput;
pub use levels::{LevelData, LevelDatabase};
pub use loops::{LoopConfig, LoopError, LoopPhase, LoopScheduler, LoopState, LoopStatus};
pub use player::{Carrier, ControlEnabled, Facing, Grounded, JumpPhase, Player, Velocity};
pub use recording::{ActionRecorder, ActionSample, PastRecordingStore, Recording};
pub use settings::LoopSettings;
pub use tick::TickSet;
pub use tuning::GameplayTuning;
