//! Metrics collection for headless runs

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::events::{EventBus, GameEvent};
use crate::ghost::{Correction, Ghost, GhostReplay};
use crate::world::Dormant;

/// Summary of one loop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopSummary {
    pub loop_index: usize,
    /// Ghosts replaying during this loop
    pub ghosts: usize,
    /// Samples recorded from the live player
    pub samples: usize,
    /// Largest distance a ghost was left from its recorded position after
    /// correction (world units)
    pub max_drift: f32,
    /// Mean ghost distance from its recorded position
    pub mean_drift: f32,
    /// Samples that snapped a ghost onto its path
    pub teleports: u32,
    /// Samples that pulled a ghost back with a force
    pub forces: u32,
    /// Ghost impacts above the effect threshold
    pub impacts: u32,
    /// Ghosts that fell out of the world
    pub ghosts_lost: u32,
    pub plates_pressed: u32,
    pub doors_opened: u32,
    #[serde(skip)]
    drift_sum: f32,
    #[serde(skip)]
    drift_samples: u32,
}

impl LoopSummary {
    fn new(loop_index: usize, ghosts: usize) -> Self {
        Self {
            loop_index,
            ghosts,
            ..default()
        }
    }

    fn add_drift(&mut self, drift: f32) {
        self.max_drift = self.max_drift.max(drift);
        self.drift_sum += drift;
        self.drift_samples += 1;
    }

    /// Calculate derived statistics
    pub fn finalize(&mut self) {
        if self.drift_samples > 0 {
            self.mean_drift = self.drift_sum / self.drift_samples as f32;
        }
    }
}

/// Result of one headless run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub level: String,
    pub ghost_mode: String,
    pub seed: u64,
    pub loops: Vec<LoopSummary>,
    pub game_over: bool,
    pub ticks: u64,
    pub duration_secs: f32,
}

impl RunSummary {
    /// Largest drift over every loop
    pub fn max_drift(&self) -> f32 {
        self.loops.iter().map(|l| l.max_drift).fold(0.0, f32::max)
    }

    pub fn total_teleports(&self) -> u32 {
        self.loops.iter().map(|l| l.teleports).sum()
    }
}

/// Per-loop metrics gathered while a headless run ticks
#[derive(Resource, Debug, Default)]
pub struct SimMetrics {
    current: Option<LoopSummary>,
    finished: Vec<LoopSummary>,
    cursors: HashMap<Entity, usize>,
    pub game_over: bool,
    pub ticks: u64,
}

impl SimMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one bus event to the running totals
    pub fn record_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::LoopStart { loop_index, ghosts } => {
                self.close_current();
                self.cursors.clear();
                self.current = Some(LoopSummary::new(*loop_index, *ghosts));
            }
            GameEvent::LoopEnd { samples, .. } => {
                if let Some(current) = self.current.as_mut() {
                    current.samples = *samples;
                }
                self.close_current();
            }
            GameEvent::GameOver { .. } => self.game_over = true,
            GameEvent::RunReset => self.game_over = false,
            GameEvent::GhostImpact { .. } => self.bump(|l| l.impacts += 1),
            GameEvent::GhostLost { .. } => self.bump(|l| l.ghosts_lost += 1),
            GameEvent::PlatePressed { .. } => self.bump(|l| l.plates_pressed += 1),
            GameEvent::DoorOpened { .. } => self.bump(|l| l.doors_opened += 1),
            _ => {}
        }
    }

    /// Measure one ghost against the sample it last applied
    pub fn record_ghost(&mut self, entity: Entity, replay: &GhostReplay) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        if replay.last_applied().is_none() {
            return;
        }
        current.add_drift(replay.residual_drift());

        // Count a correction once per applied sample, not once per tick
        let previous = self.cursors.insert(entity, replay.cursor());
        if previous == Some(replay.cursor()) {
            return;
        }
        match replay.last_correction() {
            Correction::Teleport => current.teleports += 1,
            Correction::Force(_) => current.forces += 1,
            Correction::None => {}
        }
    }

    fn bump(&mut self, f: impl FnOnce(&mut LoopSummary)) {
        if let Some(current) = self.current.as_mut() {
            f(current);
        }
    }

    fn close_current(&mut self) {
        if let Some(mut summary) = self.current.take() {
            summary.finalize();
            self.finished.push(summary);
        }
    }

    /// Finished loops, plus the one still running if the run was cut short
    pub fn into_loops(mut self) -> Vec<LoopSummary> {
        self.close_current();
        self.finished
    }

    pub fn finished(&self) -> &[LoopSummary] {
        &self.finished
    }
}

/// Measure ghost drift after the ghost phase of the tick
pub fn track_ghost_drift(
    mut metrics: ResMut<SimMetrics>,
    ghosts: Query<(Entity, &GhostReplay), (With<Ghost>, Without<Dormant>)>,
) {
    metrics.ticks += 1;
    for (entity, replay) in &ghosts {
        metrics.record_ghost(entity, replay);
    }
}

/// Read this frame's bus events before they are buffered
pub fn collect_sim_metrics(bus: Res<EventBus>, mut metrics: ResMut<SimMetrics>) {
    for event in bus.peek() {
        metrics.record_event(&event.event);
    }
}
