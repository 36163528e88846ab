//! Drift reconciliation between a ghost's live body and its recorded path

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{CORRECTION_THRESHOLD, FIDELITY_GAIN, TELEPORT_THRESHOLD};

/// How a ghost follows its recording
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Position is written straight from each sample; the body never simulates
    Exact,
    /// Velocity comes from the sample and live physics moves the body, with
    /// drift pulled back by force or teleport
    #[default]
    Physics,
}

impl ReconcileMode {
    pub fn name(&self) -> &'static str {
        match self {
            ReconcileMode::Exact => "exact",
            ReconcileMode::Physics => "physics",
        }
    }
}

/// Drift thresholds and spring gain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileTuning {
    /// Drift above this snaps the body onto the sample
    pub teleport_threshold: f32,
    /// Drift above this (up to the teleport threshold) gets a corrective force
    pub correction_threshold: f32,
    /// Force per unit of drift
    pub fidelity_gain: f32,
}

impl Default for ReconcileTuning {
    fn default() -> Self {
        Self {
            teleport_threshold: TELEPORT_THRESHOLD,
            correction_threshold: CORRECTION_THRESHOLD,
            fidelity_gain: FIDELITY_GAIN,
        }
    }
}

/// The one correction chosen for an applied sample
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Correction {
    /// Within tolerance; physics alone moves the body
    #[default]
    None,
    /// Spring force toward the sample
    Force(Vec2),
    /// Position set onto the sample, velocity kept
    Teleport,
}

impl Correction {
    /// Displacement a force correction produces over one step of `dt`
    pub fn step(&self, mass: f32, dt: f32) -> Vec2 {
        match self {
            Correction::Force(force) if mass > 0.0 => *force / mass * dt * dt,
            _ => Vec2::ZERO,
        }
    }
}

/// Pick the correction for `drift` (sample position minus body position).
///
/// The corrective force is capped so that one step of `dt` never moves a body of
/// `mass` further than the drift itself.
pub fn reconcile(drift: Vec2, mass: f32, dt: f32, tuning: &ReconcileTuning) -> Correction {
    let distance = drift.length();

    if distance > tuning.teleport_threshold {
        Correction::Teleport
    } else if distance > tuning.correction_threshold {
        let mut force = drift * tuning.fidelity_gain;
        if mass > 0.0 && dt > 0.0 {
            force = force.clamp_length_max(distance * mass / (dt * dt));
        }
        Correction::Force(force)
    } else {
        Correction::None
    }
}
