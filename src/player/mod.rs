//! Live player: components, movement and box carrying

mod components;
mod physics;
mod pickup;

pub use components::*;
pub use physics::*;
pub use pickup::*;
