//! UI module - HUD text and impact effects

mod effects;
mod hud;

pub use effects::*;
pub use hud::*;
