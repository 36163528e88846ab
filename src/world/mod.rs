//! World components for platforms, boxes and dynamic bodies

mod physics;

pub use physics::{
    Contact, collect_solids, integrate_bodies, resolve_aabb, resolve_body_collisions, shove_box,
};

use bevy::prelude::*;

use crate::constants::*;
use crate::player::Velocity;
use crate::tuning::GameplayTuning;

/// Solid axis-aligned box that bodies cannot pass through.
/// Disabled colliders (open doors) are ignored.
#[derive(Component, Debug, Clone, Copy)]
pub struct Collider {
    pub half_extents: Vec2,
    pub enabled: bool,
}

impl Collider {
    pub fn new(size: Vec2) -> Self {
        Self {
            half_extents: size / 2.0,
            enabled: true,
        }
    }
}

/// Static level geometry
#[derive(Component)]
pub struct Platform;

/// Simulated actor extents and mass (player, ghosts, boxes)
#[derive(Component, Debug, Clone, Copy)]
pub struct Body {
    pub half_extents: Vec2,
    pub mass: f32,
    pub linear_damping: f32,
}

impl Body {
    pub fn new(size: Vec2, mass: f32, linear_damping: f32) -> Self {
        Self {
            half_extents: size / 2.0,
            mass,
            linear_damping,
        }
    }
}

/// Force to apply during the next integration step, then cleared.
/// Holds at most one corrective force per tick (it is overwritten, not summed).
#[derive(Component, Default, Debug, Clone, Copy)]
pub struct CorrectiveForce(pub Vec2);

/// Body moved only by direct position writes (no integration, no collisions)
#[derive(Component)]
pub struct Kinematic;

/// Removed from simulation (fell out of the world). Kept until its loop ends.
#[derive(Component)]
pub struct Dormant;

/// Box the player can pick up and push
#[derive(Component)]
pub struct PickupBox;

/// Box currently carried by the player (not simulated)
#[derive(Component)]
pub struct Held;

/// Counts as weight on pressure plates
#[derive(Component)]
pub struct PlateActivator;

/// Collisions resolved for a body during the current tick
#[derive(Component, Default, Debug)]
pub struct ContactReport {
    pub contacts: Vec<Contact>,
}

// ============================================================================
// Spawning
// ============================================================================

/// Spawn a solid platform centered at `pos`
pub fn spawn_platform(commands: &mut Commands, pos: Vec2, size: Vec2, color: Color) -> Entity {
    commands
        .spawn((
            Sprite::from_color(color, size),
            Transform::from_xyz(pos.x, pos.y, 0.0),
            Platform,
            Collider::new(size),
        ))
        .id()
}

/// Spawn a pushable, carryable box
pub fn spawn_box(commands: &mut Commands, pos: Vec2, tuning: &GameplayTuning) -> Entity {
    commands
        .spawn((
            Sprite::from_color(BOX_COLOR, BOX_SIZE),
            Transform::from_xyz(pos.x, pos.y, 0.5),
            PickupBox,
            Body::new(BOX_SIZE, tuning.box_mass, tuning.box_linear_damping),
            Velocity::default(),
            PlateActivator,
        ))
        .id()
}
