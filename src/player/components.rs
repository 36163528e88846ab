//! Player-related components

use bevy::prelude::*;

/// Marker for the live, human-controlled player
#[derive(Component)]
pub struct Player;

/// 2D velocity vector - shared by the player, ghosts and boxes
#[derive(Component, Default, Debug, Clone, Copy)]
pub struct Velocity(pub Vec2);

/// Whether player is on ground
#[derive(Component, Default)]
pub struct Grounded(pub bool);

/// Jump lifecycle. A jump is requested (PrepareToJump), takes off (Jumping),
/// leaves the ground (InFlight), touches down (Landed) and settles (Grounded).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JumpPhase {
    #[default]
    Grounded,
    PrepareToJump,
    Jumping,
    InFlight,
    Landed,
}

/// Direction player faces (-1.0 = left, 1.0 = right)
#[derive(Component)]
pub struct Facing(pub f32);

impl Default for Facing {
    fn default() -> Self {
        Self(1.0) // Default facing right
    }
}

impl Facing {
    pub fn is_right(&self) -> bool {
        self.0 >= 0.0
    }
}

/// Whether input drives the player (off during game over)
#[derive(Component)]
pub struct ControlEnabled(pub bool);

impl Default for ControlEnabled {
    fn default() -> Self {
        Self(true)
    }
}

/// Box carrying state.
///
/// Speed while carrying is derived from the base speed every time it is read,
/// so repeated pickups can never compound a slowdown.
#[derive(Component, Debug, Clone)]
pub struct Carrier {
    pub base_speed: f32,
    pub carrying: Option<Entity>,
}

impl Carrier {
    pub fn new(base_speed: f32) -> Self {
        Self {
            base_speed,
            carrying: None,
        }
    }

    pub fn is_carrying(&self) -> bool {
        self.carrying.is_some()
    }

    /// Current top speed given the carry slowdown factor
    pub fn max_speed(&self, carry_speed_factor: f32) -> f32 {
        if self.is_carrying() {
            self.base_speed * carry_speed_factor
        } else {
            self.base_speed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carry_speed_does_not_compound() {
        let mut carrier = Carrier::new(7.0);
        for _ in 0..3 {
            carrier.carrying = Some(Entity::PLACEHOLDER);
            assert!((carrier.max_speed(0.8) - 5.6).abs() < 1e-5);
        }
        carrier.carrying = None;
        assert_eq!(carrier.max_speed(0.8), 7.0);
    }
}
