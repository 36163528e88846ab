//! Global gameplay tuning settings

use bevy::log::warn;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::ghost::ReconcileTuning;

/// Path to global gameplay tuning config
pub const GAMEPLAY_TUNING_FILE: &str = "config/gameplay_tuning.json";

/// Serializable tuning values stored in config. Missing fields keep their defaults.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayTuning {
    // Player movement
    pub gravity_rise: f32,
    pub gravity_fall: f32,
    pub jump_velocity: f32,
    pub move_speed: f32,
    pub ground_accel: f32,
    pub ground_decel: f32,
    pub air_accel: f32,
    pub air_decel: f32,
    // Carrying
    pub carry_speed_factor: f32,
    pub pickup_range: f32,
    // Dynamic bodies
    pub body_gravity: f32,
    pub ghost_mass: f32,
    pub ghost_linear_damping: f32,
    pub box_mass: f32,
    pub box_linear_damping: f32,
    // Ghost reconciliation
    pub teleport_threshold: f32,
    pub correction_threshold: f32,
    pub fidelity_gain: f32,
    pub min_impact_speed: f32,
    // World
    pub fall_limit_y: f32,
}

impl Default for GameplayTuning {
    fn default() -> Self {
        Self {
            gravity_rise: GRAVITY_RISE,
            gravity_fall: GRAVITY_FALL,
            jump_velocity: JUMP_VELOCITY,
            move_speed: MOVE_SPEED,
            ground_accel: GROUND_ACCEL,
            ground_decel: GROUND_DECEL,
            air_accel: AIR_ACCEL,
            air_decel: AIR_DECEL,
            carry_speed_factor: CARRY_SPEED_FACTOR,
            pickup_range: PICKUP_RANGE,
            body_gravity: BODY_GRAVITY,
            ghost_mass: GHOST_MASS,
            ghost_linear_damping: GHOST_LINEAR_DAMPING,
            box_mass: BOX_MASS,
            box_linear_damping: BOX_LINEAR_DAMPING,
            teleport_threshold: TELEPORT_THRESHOLD,
            correction_threshold: CORRECTION_THRESHOLD,
            fidelity_gain: FIDELITY_GAIN,
            min_impact_speed: MIN_IMPACT_SPEED,
            fall_limit_y: FALL_LIMIT_Y,
        }
    }
}

impl GameplayTuning {
    /// Reconciliation parameters for ghost replay
    pub fn reconcile(&self) -> ReconcileTuning {
        ReconcileTuning {
            teleport_threshold: self.teleport_threshold,
            correction_threshold: self.correction_threshold,
            fidelity_gain: self.fidelity_gain,
        }
    }
}

pub fn load_gameplay_tuning_from_file(path: &str) -> Result<GameplayTuning, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
    serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))
}

/// Load tuning from the config file, falling back to defaults
pub fn load_global_tuning() -> GameplayTuning {
    match load_gameplay_tuning_from_file(GAMEPLAY_TUNING_FILE) {
        Ok(tuning) => tuning,
        Err(err) => {
            warn!("{}, using default tuning", err);
            GameplayTuning::default()
        }
    }
}
