//! Ghost replay - past loops replayed by actors that still take part in physics.

mod reconcile;
mod replay;
mod systems;

pub use reconcile::{Correction, ReconcileMode, ReconcileTuning, reconcile};
pub use replay::{GhostReplay, ReplayBody};
pub use systems::{
    Ghost, GhostBoxIndicator, GhostPose, deactivate_fallen_ghosts, ghost_playback,
    report_ghost_impacts, spawn_ghost, update_ghost_visuals,
};
