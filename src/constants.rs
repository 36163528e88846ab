//! Tunable constants for timeloop
//!
//! World units are "tiles": the player is roughly one unit wide.

use bevy::prelude::*;

// =============================================================================
// COLORS
// =============================================================================

pub const BACKGROUND_COLOR: Color = Color::srgb(0.12, 0.13, 0.17);
pub const PLATFORM_COLOR: Color = Color::srgb(0.3, 0.32, 0.38);
pub const PLAYER_COLOR: Color = Color::srgb(0.95, 0.85, 0.55);
pub const GHOST_COLOR: Color = Color::srgb(0.55, 0.8, 1.0);
pub const BOX_COLOR: Color = Color::srgb(0.65, 0.45, 0.25);
pub const DOOR_COLOR: Color = Color::srgb(0.5, 0.2, 0.25);
pub const PLATE_OFF_COLOR: Color = Color::srgb(0.8, 0.2, 0.2);
pub const PLATE_ON_COLOR: Color = Color::srgb(0.2, 0.8, 0.2);
pub const IMPACT_COLOR: Color = Color::srgb(1.0, 1.0, 1.0);

pub const TEXT_PRIMARY: Color = Color::srgb(0.95, 0.9, 0.8);
pub const TEXT_ACCENT: Color = Color::srgb(0.9, 0.75, 0.4);

// =============================================================================
// SIZES
// =============================================================================

pub const PLAYER_SIZE: Vec2 = Vec2::new(0.8, 1.0);
pub const BOX_SIZE: Vec2 = Vec2::new(0.8, 0.8);
pub const PLATE_HEIGHT: f32 = 0.2;
/// How far the plate visual sinks when pressed
pub const PLATE_PRESS_DEPTH: f32 = 0.1;
/// Held box offset from the player center (x is mirrored by facing)
pub const HOLD_OFFSET: Vec2 = Vec2::new(0.0, 0.95);

// =============================================================================
// TICK
// =============================================================================

/// Fixed simulation rate. 1/64 s is exact in binary so headless runs accumulate
/// whole ticks without drift.
pub const TICK_HZ: f64 = 64.0;

// =============================================================================
// PLAYER PHYSICS
// =============================================================================

pub const GRAVITY_RISE: f32 = 22.0; // Gravity while rising
pub const GRAVITY_FALL: f32 = 30.0; // Gravity while falling (fast fall)
pub const JUMP_VELOCITY: f32 = 10.5;
pub const JUMP_CUT_MULTIPLIER: f32 = 0.5; // Vertical speed kept when jump released early
pub const MOVE_SPEED: f32 = 7.0;
pub const GROUND_ACCEL: f32 = 70.0;
pub const GROUND_DECEL: f32 = 55.0;
pub const AIR_ACCEL: f32 = 45.0;
pub const AIR_DECEL: f32 = 25.0;
pub const COLLISION_EPSILON: f32 = 0.01; // Skin width for collision detection
pub const JUMP_BUFFER_TIME: f32 = 0.1;
pub const STICK_DEADZONE: f32 = 0.25;

// =============================================================================
// CARRYING
// =============================================================================

pub const CARRY_SPEED_FACTOR: f32 = 0.8;
pub const PICKUP_RANGE: f32 = 1.0;
/// Velocity given to a dropped box: (facing * x, y)
pub const DROP_VELOCITY: Vec2 = Vec2::new(2.0, 1.0);

// =============================================================================
// DYNAMIC BODIES
// =============================================================================

pub const BODY_GRAVITY: f32 = 25.0;
pub const GHOST_MASS: f32 = 0.8;
pub const GHOST_LINEAR_DAMPING: f32 = 0.5;
pub const BOX_MASS: f32 = 1.0;
pub const BOX_LINEAR_DAMPING: f32 = 2.0;

// =============================================================================
// GHOST RECONCILIATION
// =============================================================================

/// Drift above this snaps the ghost onto the recorded path
pub const TELEPORT_THRESHOLD: f32 = 0.5;
/// Drift above this (and up to the teleport threshold) gets a corrective force
pub const CORRECTION_THRESHOLD: f32 = 0.1;
/// Corrective force per unit of drift
pub const FIDELITY_GAIN: f32 = 5.0;
/// Relative speed a ghost collision needs to raise an impact effect
pub const MIN_IMPACT_SPEED: f32 = 2.0;
/// Ghost alpha for the most recent recording, reduced 0.1 per older loop
pub const GHOST_ALPHA_MAX: f32 = 0.7;
pub const GHOST_ALPHA_MIN: f32 = 0.2;
pub const GHOST_ALPHA_STEP: f32 = 0.1;

// =============================================================================
// WORLD
// =============================================================================

/// Anything below this height has fallen out of the world
pub const FALL_LIMIT_Y: f32 = -20.0;
/// Visible world height (camera FixedVertical)
pub const VIEW_HEIGHT: f32 = 18.0;

// =============================================================================
// LOOPS
// =============================================================================

pub const LOOP_DURATION: f32 = 8.0;
pub const MAX_LOOPS: usize = 5;
pub const GAME_OVER_DELAY: f32 = 3.0;
/// Seconds added to the current loop by the add-time key
pub const ADD_TIME_STEP: f32 = 2.0;

// =============================================================================
// FILES
// =============================================================================

pub const LEVELS_FILE: &str = "assets/levels.toml";
