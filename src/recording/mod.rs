//! Action recording - captures one loop of player behavior for later replay.

mod recorder;
mod sample;
mod store;

pub use recorder::{ActionRecorder, record_player_actions};
pub use sample::{ActionSample, AnimationState, PlayerSnapshot, Recording};
pub use store::PastRecordingStore;
