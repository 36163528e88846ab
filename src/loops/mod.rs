//! Loop scheduling - fixed-length attempts, each replayed by a ghost in later loops.

mod scheduler;
mod systems;

pub use scheduler::{
    GhostSpawn, LoopConfig, LoopDirective, LoopError, LoopPhase, LoopScheduler, LoopState,
    LoopStatus,
};
pub use systems::{LoopEffects, drive_loop_scheduler, process_loop_requests, return_fallen_player};
