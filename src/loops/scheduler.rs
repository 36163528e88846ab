//! Loop scheduler state machine
//!
//! Owns loop timing and the store of past recordings. It never touches the ECS
//! world directly: every transition pushes `LoopDirective`s that the loop systems
//! carry out in the same tick, in the order they were pushed.

use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;

use crate::constants::{LOOP_DURATION, MAX_LOOPS};
use crate::recording::{ActionRecorder, PastRecordingStore, Recording};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopPhase {
    #[default]
    Idle,
    Running,
    Ending,
    GameOver,
}

impl LoopPhase {
    pub fn name(&self) -> &'static str {
        match self {
            LoopPhase::Idle => "idle",
            LoopPhase::Running => "running",
            LoopPhase::Ending => "ending",
            LoopPhase::GameOver => "game_over",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopError {
    /// No spawn point configured; a loop cannot start
    MissingSpawnPoint,
    /// Rejected loop configuration
    InvalidConfig(String),
}

impl fmt::Display for LoopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopError::MissingSpawnPoint => write!(f, "no spawn point configured, loop not started"),
            LoopError::InvalidConfig(reason) => write!(f, "invalid loop config: {}", reason),
        }
    }
}

impl std::error::Error for LoopError {}

/// Validated loop timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopConfig {
    loop_duration: f32,
    max_loops: usize,
    game_ends_after_max_loops: bool,
}

impl LoopConfig {
    pub fn new(
        loop_duration: f32,
        max_loops: usize,
        game_ends_after_max_loops: bool,
    ) -> Result<Self, LoopError> {
        if !(loop_duration > 0.0 && loop_duration.is_finite()) {
            return Err(LoopError::InvalidConfig(format!(
                "loop_duration must be positive, got {}",
                loop_duration
            )));
        }
        if max_loops == 0 {
            return Err(LoopError::InvalidConfig(
                "max_loops must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            loop_duration,
            max_loops,
            game_ends_after_max_loops,
        })
    }

    pub fn loop_duration(&self) -> f32 {
        self.loop_duration
    }

    pub fn max_loops(&self) -> usize {
        self.max_loops
    }

    pub fn game_ends_after_max_loops(&self) -> bool {
        self.game_ends_after_max_loops
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            loop_duration: LOOP_DURATION,
            max_loops: MAX_LOOPS,
            game_ends_after_max_loops: true,
        }
    }
}

/// Run state, mutated only by the scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopState {
    pub loop_index: usize,
    pub loop_start_time: f32,
    pub is_active: bool,
}

/// Everything needed to spawn one ghost
#[derive(Debug, Clone)]
pub struct GhostSpawn {
    /// Index in the past recording store (0 = oldest)
    pub recording_index: usize,
    pub recording: Arc<Recording>,
    pub loop_start_time: f32,
    /// Fallback position for an empty recording
    pub spawn_point: Vec3,
    /// Ghosts spawned this loop
    pub total: usize,
}

/// World changes requested by a transition
#[derive(Debug, Clone)]
pub enum LoopDirective {
    /// Remove every ghost entity
    DespawnGhosts,
    /// Move the live player (drops any held box)
    TeleportPlayer(Vec3),
    SetPlayerControl(bool),
    SpawnGhost(GhostSpawn),
    LoopStarted { loop_index: usize, ghosts: usize },
    LoopEnded { loop_index: usize, samples: usize },
    GameOver { loops: usize },
    RunReset,
}

/// Read-only view for the HUD
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopStatus {
    pub phase: LoopPhase,
    pub loop_index: usize,
    pub max_loops: usize,
    pub time_remaining: f32,
    pub active_ghosts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopRequest {
    Start,
    Reset,
}

#[derive(Resource, Debug)]
pub struct LoopScheduler {
    config: LoopConfig,
    phase: LoopPhase,
    state: LoopState,
    store: PastRecordingStore,
    spawn_point: Option<Vec3>,
    active_ghosts: usize,
    /// Seconds added to the running loop
    extension: f32,
    pending: Option<LoopRequest>,
    game_over_at: Option<f32>,
}

impl LoopScheduler {
    pub fn new(config: LoopConfig, spawn_point: Option<Vec3>) -> Self {
        Self {
            config,
            phase: LoopPhase::Idle,
            state: LoopState::default(),
            store: PastRecordingStore::new(),
            spawn_point,
            active_ghosts: 0,
            extension: 0.0,
            pending: None,
            game_over_at: None,
        }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn store(&self) -> &PastRecordingStore {
        &self.store
    }

    pub fn spawn_point(&self) -> Option<Vec3> {
        self.spawn_point
    }

    /// Takes effect the next time a loop begins
    pub fn set_spawn_point(&mut self, spawn_point: Option<Vec3>) {
        self.spawn_point = spawn_point;
    }

    pub fn active_ghosts(&self) -> usize {
        self.active_ghosts
    }

    /// When the run ended, while in `GameOver`
    pub fn game_over_at(&self) -> Option<f32> {
        self.game_over_at
    }

    /// Queue a start for the top of the next tick. A pending reset wins.
    pub fn request_start(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(LoopRequest::Start);
        }
    }

    /// Queue a reset for the top of the next tick
    pub fn request_reset(&mut self) {
        self.pending = Some(LoopRequest::Reset);
    }

    pub fn has_pending_request(&self) -> bool {
        self.pending.is_some()
    }

    /// Carry out a queued start or reset
    pub fn process_requests(
        &mut self,
        now: f32,
        recorder: &mut ActionRecorder,
        out: &mut Vec<LoopDirective>,
    ) -> Result<(), LoopError> {
        match self.pending.take() {
            Some(LoopRequest::Start) => self.start(now, recorder, out),
            Some(LoopRequest::Reset) => self.reset(now, recorder, out),
            None => Ok(()),
        }
    }

    /// `Idle -> Running`. Ignored in any other phase.
    ///
    /// Without a spawn point the start is refused: the scheduler stays `Idle`,
    /// no directives are pushed and the recorder is left alone.
    pub fn start(
        &mut self,
        now: f32,
        recorder: &mut ActionRecorder,
        out: &mut Vec<LoopDirective>,
    ) -> Result<(), LoopError> {
        if self.phase != LoopPhase::Idle {
            debug!("Start ignored while {}", self.phase.name());
            return Ok(());
        }
        self.begin_loop(now, recorder, out)
    }

    /// Clear the store, drop every ghost and start again from loop 0.
    /// Valid from any phase; the only way out of `GameOver`.
    pub fn reset(
        &mut self,
        now: f32,
        recorder: &mut ActionRecorder,
        out: &mut Vec<LoopDirective>,
    ) -> Result<(), LoopError> {
        out.push(LoopDirective::DespawnGhosts);
        self.active_ghosts = 0;
        // The interrupted attempt is discarded
        let _ = recorder.end();
        self.store.clear();
        self.state = LoopState::default();
        self.phase = LoopPhase::Idle;
        self.game_over_at = None;
        out.push(LoopDirective::RunReset);
        info!("Run reset");
        self.begin_loop(now, recorder, out)
    }

    /// Per-tick check of the running loop's clock
    pub fn tick(
        &mut self,
        now: f32,
        recorder: &mut ActionRecorder,
        out: &mut Vec<LoopDirective>,
    ) -> Result<(), LoopError> {
        if self.phase != LoopPhase::Running {
            return Ok(());
        }
        let elapsed = now - self.state.loop_start_time;
        if elapsed < self.config.loop_duration + self.extension {
            return Ok(());
        }
        self.end_loop(recorder, out);
        self.advance(now, recorder, out)
    }

    /// Extend the running loop
    pub fn add_time(&mut self, seconds: f32) {
        if self.phase == LoopPhase::Running && seconds > 0.0 {
            self.extension += seconds;
        }
    }

    pub fn status(&self, now: f32) -> LoopStatus {
        let time_remaining = match self.phase {
            LoopPhase::Running => (self.config.loop_duration + self.extension
                - (now - self.state.loop_start_time))
                .max(0.0),
            LoopPhase::Idle => self.config.loop_duration,
            LoopPhase::Ending | LoopPhase::GameOver => 0.0,
        };
        LoopStatus {
            phase: self.phase,
            loop_index: self.state.loop_index,
            max_loops: self.config.max_loops,
            time_remaining,
            active_ghosts: self.active_ghosts,
        }
    }

    /// Enter `Running`: record the player and spawn one ghost per stored recording
    fn begin_loop(
        &mut self,
        now: f32,
        recorder: &mut ActionRecorder,
        out: &mut Vec<LoopDirective>,
    ) -> Result<(), LoopError> {
        let Some(spawn_point) = self.spawn_point else {
            self.phase = LoopPhase::Idle;
            self.state.is_active = false;
            return Err(LoopError::MissingSpawnPoint);
        };

        self.state.loop_start_time = now;
        self.state.is_active = true;
        self.extension = 0.0;
        self.phase = LoopPhase::Running;

        out.push(LoopDirective::TeleportPlayer(spawn_point));
        out.push(LoopDirective::SetPlayerControl(true));
        recorder.begin(now);

        let total = self.store.len();
        for (recording_index, recording) in self.store.iter().enumerate() {
            out.push(LoopDirective::SpawnGhost(GhostSpawn {
                recording_index,
                recording: Arc::clone(recording),
                loop_start_time: now,
                spawn_point,
                total,
            }));
        }
        self.active_ghosts = total;

        info!(
            "Loop {}/{} started with {} ghosts",
            self.state.loop_index + 1,
            self.config.max_loops,
            total
        );
        out.push(LoopDirective::LoopStarted {
            loop_index: self.state.loop_index,
            ghosts: total,
        });
        Ok(())
    }

    /// `Running -> Ending`: ghosts go first, then the recording is stored
    fn end_loop(&mut self, recorder: &mut ActionRecorder, out: &mut Vec<LoopDirective>) {
        self.phase = LoopPhase::Ending;
        self.state.is_active = false;

        out.push(LoopDirective::DespawnGhosts);
        self.active_ghosts = 0;

        let recording = recorder.end();
        let samples = recording.len();
        if recording.is_empty() {
            debug!("Loop {} recorded no samples", self.state.loop_index + 1);
        }
        self.store.append(recording);

        info!(
            "Loop {}/{} ended ({} samples)",
            self.state.loop_index + 1,
            self.config.max_loops,
            samples
        );
        out.push(LoopDirective::LoopEnded {
            loop_index: self.state.loop_index,
            samples,
        });
    }

    /// Leave `Ending`: next loop, game over, or wrap around
    fn advance(
        &mut self,
        now: f32,
        recorder: &mut ActionRecorder,
        out: &mut Vec<LoopDirective>,
    ) -> Result<(), LoopError> {
        if self.state.loop_index + 1 < self.config.max_loops {
            self.state.loop_index += 1;
            return self.begin_loop(now, recorder, out);
        }

        if self.config.game_ends_after_max_loops {
            self.phase = LoopPhase::GameOver;
            self.game_over_at = Some(now);
            info!("Maximum loops reached, game over");
            out.push(LoopDirective::SetPlayerControl(false));
            out.push(LoopDirective::GameOver {
                loops: self.state.loop_index + 1,
            });
            return Ok(());
        }

        self.store.clear();
        self.state.loop_index = 0;
        info!("Maximum loops reached, starting over");
        out.push(LoopDirective::RunReset);
        self.begin_loop(now, recorder, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::PlayerSnapshot;

    const SPAWN: Vec3 = Vec3::new(-5.0, 1.0, 0.0);

    fn scheduler(max_loops: usize, ends: bool) -> LoopScheduler {
        LoopScheduler::new(LoopConfig::new(8.0, max_loops, ends).unwrap(), Some(SPAWN))
    }

    fn spawned(out: &[LoopDirective]) -> Vec<usize> {
        out.iter()
            .filter_map(|d| match d {
                LoopDirective::SpawnGhost(spawn) => Some(spawn.recording_index),
                _ => None,
            })
            .collect()
    }

    /// Run one whole loop from `start`, sampling every 1/64 s
    fn play_loop(
        scheduler: &mut LoopScheduler,
        recorder: &mut ActionRecorder,
        start: f32,
        out: &mut Vec<LoopDirective>,
    ) -> f32 {
        let mut now = start;
        loop {
            now += 1.0 / 64.0;
            recorder.sample(now, &PlayerSnapshot::default());
            scheduler.tick(now, recorder, out).unwrap();
            if scheduler.state().loop_start_time != start || scheduler.phase() != LoopPhase::Running
            {
                return now;
            }
        }
    }

    #[test]
    fn test_three_loop_run_ends_in_game_over() {
        let mut scheduler = scheduler(3, true);
        let mut recorder = ActionRecorder::default();
        let mut out = Vec::new();

        scheduler.start(0.0, &mut recorder, &mut out).unwrap();
        assert_eq!(scheduler.phase(), LoopPhase::Running);
        assert_eq!(scheduler.active_ghosts(), 0);
        assert!(spawned(&out).is_empty());

        out.clear();
        let t1 = play_loop(&mut scheduler, &mut recorder, 0.0, &mut out);
        assert_eq!(scheduler.state().loop_index, 1);
        assert_eq!(spawned(&out), vec![0]);
        assert_eq!(scheduler.active_ghosts(), 1);

        out.clear();
        let t2 = play_loop(&mut scheduler, &mut recorder, t1, &mut out);
        assert_eq!(scheduler.state().loop_index, 2);
        assert_eq!(spawned(&out), vec![0, 1]);

        out.clear();
        play_loop(&mut scheduler, &mut recorder, t2, &mut out);
        assert_eq!(scheduler.phase(), LoopPhase::GameOver);
        assert_eq!(scheduler.store().len(), 3);
        assert!(spawned(&out).is_empty());
        assert!(
            out.iter()
                .any(|d| matches!(d, LoopDirective::GameOver { loops: 3 }))
        );

        // Terminal: no further loop starts
        out.clear();
        for i in 0..1000 {
            scheduler.tick(100.0 + i as f32, &mut recorder, &mut out).unwrap();
        }
        scheduler.start(2000.0, &mut recorder, &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(scheduler.phase(), LoopPhase::GameOver);
    }

    #[test]
    fn test_loop_boundary_order() {
        let mut scheduler = scheduler(5, true);
        let mut recorder = ActionRecorder::default();
        let mut out = Vec::new();
        scheduler.start(0.0, &mut recorder, &mut out).unwrap();
        recorder.sample(1.0, &PlayerSnapshot::default());

        out.clear();
        scheduler.tick(8.0, &mut recorder, &mut out).unwrap();

        let despawn = out
            .iter()
            .position(|d| matches!(d, LoopDirective::DespawnGhosts))
            .unwrap();
        let ended = out
            .iter()
            .position(|d| matches!(d, LoopDirective::LoopEnded { samples: 1, .. }))
            .unwrap();
        let spawn = out
            .iter()
            .position(|d| matches!(d, LoopDirective::SpawnGhost(_)))
            .unwrap();
        let teleport = out
            .iter()
            .position(|d| matches!(d, LoopDirective::TeleportPlayer(p) if *p == SPAWN))
            .unwrap();
        assert!(despawn < ended);
        assert!(ended < teleport);
        assert!(teleport < spawn);
        assert!(recorder.is_recording());
        assert_eq!(recorder.loop_start_time(), 8.0);
    }

    #[test]
    fn test_loop_does_not_end_early() {
        let mut scheduler = scheduler(5, true);
        let mut recorder = ActionRecorder::default();
        let mut out = Vec::new();
        scheduler.start(2.0, &mut recorder, &mut out).unwrap();
        out.clear();
        scheduler.tick(9.99, &mut recorder, &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(scheduler.state().loop_index, 0);
        scheduler.tick(10.0, &mut recorder, &mut out).unwrap();
        assert_eq!(scheduler.state().loop_index, 1);
    }

    #[test]
    fn test_reset_clears_store_from_any_phase() {
        let mut scheduler = scheduler(2, true);
        let mut recorder = ActionRecorder::default();
        let mut out = Vec::new();
        scheduler.start(0.0, &mut recorder, &mut out).unwrap();
        scheduler.tick(8.0, &mut recorder, &mut out).unwrap();
        scheduler.tick(16.0, &mut recorder, &mut out).unwrap();
        assert_eq!(scheduler.phase(), LoopPhase::GameOver);
        assert_eq!(scheduler.store().len(), 2);

        out.clear();
        scheduler.request_reset();
        scheduler
            .process_requests(20.0, &mut recorder, &mut out)
            .unwrap();
        assert_eq!(scheduler.phase(), LoopPhase::Running);
        assert!(scheduler.store().is_empty());
        assert_eq!(scheduler.state().loop_index, 0);
        assert_eq!(scheduler.active_ghosts(), 0);
        assert!(spawned(&out).is_empty());
        assert!(matches!(out[0], LoopDirective::DespawnGhosts));
        assert!(out.iter().any(|d| matches!(d, LoopDirective::RunReset)));
        assert!(scheduler.game_over_at().is_none());

        // Mid-loop reset discards the attempt in progress
        scheduler.tick(28.0, &mut recorder, &mut out).unwrap();
        assert_eq!(scheduler.store().len(), 1);
        scheduler.reset(30.0, &mut recorder, &mut out).unwrap();
        assert!(scheduler.store().is_empty());
        assert_eq!(scheduler.state().loop_start_time, 30.0);
    }

    #[test]
    fn test_missing_spawn_point_refuses_start() {
        let mut scheduler = LoopScheduler::new(LoopConfig::default(), None);
        let mut recorder = ActionRecorder::default();
        let mut out = Vec::new();

        let result = scheduler.start(0.0, &mut recorder, &mut out);
        assert_eq!(result, Err(LoopError::MissingSpawnPoint));
        assert_eq!(scheduler.phase(), LoopPhase::Idle);
        assert!(out.is_empty());
        assert!(!recorder.is_recording());
        assert!(!scheduler.state().is_active);

        // Not retried by ticking
        scheduler.tick(100.0, &mut recorder, &mut out).unwrap();
        assert_eq!(scheduler.phase(), LoopPhase::Idle);

        // Recovery: configure and start again
        scheduler.set_spawn_point(Some(SPAWN));
        scheduler.request_start();
        scheduler
            .process_requests(101.0, &mut recorder, &mut out)
            .unwrap();
        assert_eq!(scheduler.phase(), LoopPhase::Running);
    }

    #[test]
    fn test_endless_run_wraps_to_loop_zero() {
        let mut scheduler = scheduler(2, false);
        let mut recorder = ActionRecorder::default();
        let mut out = Vec::new();
        scheduler.start(0.0, &mut recorder, &mut out).unwrap();
        scheduler.tick(8.0, &mut recorder, &mut out).unwrap();
        assert_eq!(scheduler.active_ghosts(), 1);

        out.clear();
        scheduler.tick(16.0, &mut recorder, &mut out).unwrap();
        assert_eq!(scheduler.phase(), LoopPhase::Running);
        assert_eq!(scheduler.state().loop_index, 0);
        assert!(scheduler.store().is_empty());
        assert_eq!(scheduler.active_ghosts(), 0);
        assert!(spawned(&out).is_empty());
        assert!(out.iter().any(|d| matches!(d, LoopDirective::RunReset)));
    }

    #[test]
    fn test_add_time_extends_running_loop() {
        let mut scheduler = scheduler(5, true);
        let mut recorder = ActionRecorder::default();
        let mut out = Vec::new();
        scheduler.add_time(2.0);
        scheduler.start(0.0, &mut recorder, &mut out).unwrap();
        assert_eq!(scheduler.status(0.0).time_remaining, 8.0);

        scheduler.add_time(2.0);
        assert_eq!(scheduler.status(1.0).time_remaining, 9.0);
        scheduler.tick(8.0, &mut recorder, &mut out).unwrap();
        assert_eq!(scheduler.state().loop_index, 0);
        scheduler.tick(10.0, &mut recorder, &mut out).unwrap();
        assert_eq!(scheduler.state().loop_index, 1);
        // Extension does not carry into the next loop
        assert_eq!(scheduler.status(10.0).time_remaining, 8.0);
    }

    #[test]
    fn test_status_view() {
        let mut scheduler = scheduler(5, true);
        let mut recorder = ActionRecorder::default();
        let mut out = Vec::new();
        let idle = scheduler.status(0.0);
        assert_eq!(idle.phase, LoopPhase::Idle);
        assert_eq!(idle.time_remaining, 8.0);

        scheduler.start(1.0, &mut recorder, &mut out).unwrap();
        let status = scheduler.status(3.5);
        assert_eq!(status.loop_index, 0);
        assert_eq!(status.max_loops, 5);
        assert_eq!(status.time_remaining, 5.5);
        assert_eq!(status.active_ghosts, 0);
    }

    #[test]
    fn test_reset_request_supersedes_start() {
        let mut scheduler = scheduler(5, true);
        scheduler.request_reset();
        scheduler.request_start();
        let mut recorder = ActionRecorder::default();
        let mut out = Vec::new();
        scheduler
            .process_requests(0.0, &mut recorder, &mut out)
            .unwrap();
        assert!(out.iter().any(|d| matches!(d, LoopDirective::RunReset)));
        assert!(!scheduler.has_pending_request());
    }

    #[test]
    fn test_config_validation() {
        assert!(LoopConfig::new(0.0, 3, true).is_err());
        assert!(LoopConfig::new(-1.0, 3, true).is_err());
        assert!(LoopConfig::new(f32::NAN, 3, true).is_err());
        assert!(matches!(
            LoopConfig::new(8.0, 0, true),
            Err(LoopError::InvalidConfig(_))
        ));
        let config = LoopConfig::new(4.0, 1, false).unwrap();
        assert_eq!(config.max_loops(), 1);
        assert_eq!(
            LoopError::MissingSpawnPoint.to_string(),
            "no spawn point configured, loop not started"
        );
    }
}
