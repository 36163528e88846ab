//! Ghost playback: step through a recording and drive a body with it

use std::sync::Arc;

use bevy::prelude::*;

use super::reconcile::{Correction, ReconcileMode, ReconcileTuning, reconcile};
use crate::recording::{ActionSample, Recording};

/// What replay needs from the body it drives
pub trait ReplayBody {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn set_velocity(&mut self, velocity: Vec2);
    /// Replaces any force set earlier in the same tick
    fn set_corrective_force(&mut self, force: Vec2);
    fn mass(&self) -> f32;
    /// Presentation state (facing, animation, carried box)
    fn set_pose(&mut self, sample: &ActionSample);
}

/// Replays one recording during one loop.
///
/// Playback is a step function: the target is always the latest sample whose
/// offset has elapsed, never an interpolation. The cursor counts applied
/// samples, only moves forward and stops at the recording's length.
#[derive(Component, Debug, Clone)]
pub struct GhostReplay {
    recording: Arc<Recording>,
    loop_start_time: f32,
    cursor: usize,
    mode: ReconcileMode,
    last_correction: Correction,
    /// Distance left to the last applied sample once it was corrected
    residual_drift: f32,
}

impl GhostReplay {
    pub fn new(recording: Arc<Recording>, loop_start_time: f32, mode: ReconcileMode) -> Self {
        Self {
            recording,
            loop_start_time,
            cursor: 0,
            mode,
            last_correction: Correction::None,
            residual_drift: 0.0,
        }
    }

    /// Attach a recording and rewind
    pub fn initialize(&mut self, recording: Arc<Recording>, loop_start_time: f32) {
        self.recording = recording;
        self.loop_start_time = loop_start_time;
        self.cursor = 0;
        self.last_correction = Correction::None;
        self.residual_drift = 0.0;
    }

    /// Where the body should start (sample 0), or None for an empty recording
    pub fn initial_position(&self) -> Option<Vec3> {
        self.recording.first().map(|s| s.position)
    }

    /// Apply every sample whose offset has elapsed at `now`, in order.
    /// Returns the number applied this tick.
    pub fn tick(
        &mut self,
        now: f32,
        dt: f32,
        body: &mut impl ReplayBody,
        tuning: &ReconcileTuning,
    ) -> usize {
        let playback_time = now - self.loop_start_time;
        let mut applied = 0;

        while let Some(sample) = self.recording.get(self.cursor) {
            if sample.t_offset > playback_time {
                break;
            }
            let drift = sample.position.truncate().distance(body.position().truncate());
            self.last_correction = self.apply(sample, dt, body, tuning);
            self.residual_drift = match (self.mode, self.last_correction) {
                (ReconcileMode::Exact, _) | (_, Correction::Teleport) => 0.0,
                _ => drift,
            };
            self.cursor += 1;
            applied += 1;
        }

        applied
    }

    /// Drive the body toward one sample
    pub fn apply(
        &self,
        sample: &ActionSample,
        dt: f32,
        body: &mut impl ReplayBody,
        tuning: &ReconcileTuning,
    ) -> Correction {
        body.set_pose(sample);
        let current = body.position();
        let target = sample.position.truncate().extend(current.z);

        match self.mode {
            ReconcileMode::Exact => {
                body.set_position(target);
                Correction::None
            }
            ReconcileMode::Physics => {
                body.set_velocity(sample.velocity);
                let drift = target.truncate() - current.truncate();
                let correction = reconcile(drift, body.mass(), dt, tuning);
                match correction {
                    Correction::Teleport => {
                        body.set_position(target);
                        body.set_corrective_force(Vec2::ZERO);
                    }
                    Correction::Force(force) => body.set_corrective_force(force),
                    Correction::None => body.set_corrective_force(Vec2::ZERO),
                }
                correction
            }
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mode(&self) -> ReconcileMode {
        self.mode
    }

    pub fn recording(&self) -> &Arc<Recording> {
        &self.recording
    }

    pub fn loop_start_time(&self) -> f32 {
        self.loop_start_time
    }

    /// Every sample has been applied; the ghost holds its last state
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.recording.len()
    }

    /// Most recently applied sample
    pub fn last_applied(&self) -> Option<&ActionSample> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.recording.get(i))
    }

    /// Correction chosen for the most recently applied sample
    pub fn last_correction(&self) -> Correction {
        self.last_correction
    }

    /// Drift remaining after the most recent correction. Never above the
    /// teleport threshold in physics mode, always zero in exact mode.
    pub fn residual_drift(&self) -> f32 {
        self.residual_drift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{AnimationState, PlayerSnapshot};

    const DT: f32 = 1.0 / 64.0;

    #[derive(Default)]
    struct TestBody {
        position: Vec3,
        velocity: Vec2,
        force: Vec2,
        poses: Vec<AnimationState>,
        position_writes: usize,
    }

    impl ReplayBody for TestBody {
        fn position(&self) -> Vec3 {
            self.position
        }
        fn set_position(&mut self, position: Vec3) {
            self.position = position;
            self.position_writes += 1;
        }
        fn set_velocity(&mut self, velocity: Vec2) {
            self.velocity = velocity;
        }
        fn set_corrective_force(&mut self, force: Vec2) {
            self.force = force;
        }
        fn mass(&self) -> f32 {
            0.8
        }
        fn set_pose(&mut self, sample: &ActionSample) {
            self.poses.push(sample.animation);
        }
    }

    fn sample(t: f32, x: f32) -> ActionSample {
        ActionSample::from_snapshot(
            t,
            &PlayerSnapshot {
                position: Vec3::new(x, 0.0, 0.0),
                velocity: Vec2::new(2.0, 0.0),
                ..default()
            },
        )
    }

    fn recording(offsets: &[f32]) -> Arc<Recording> {
        Arc::new(Recording::from_ordered(
            offsets
                .iter()
                .enumerate()
                .map(|(i, t)| sample(*t, i as f32 * 0.01))
                .collect(),
        ))
    }

    #[test]
    fn test_cursor_scenario() {
        let mut replay = GhostReplay::new(recording(&[0.0, 0.016, 0.033]), 5.0, ReconcileMode::Physics);
        let mut body = TestBody::default();
        let applied = replay.tick(5.02, DT, &mut body, &ReconcileTuning::default());
        assert_eq!(applied, 2);
        assert_eq!(replay.cursor(), 2);
        assert_eq!(replay.last_applied().map(|s| s.t_offset), Some(0.016));
    }

    #[test]
    fn test_cursor_clamps_and_state_freezes() {
        let mut replay = GhostReplay::new(recording(&[0.0, 0.1]), 0.0, ReconcileMode::Exact);
        let mut body = TestBody::default();
        let tuning = ReconcileTuning::default();

        replay.tick(1.0, DT, &mut body, &tuning);
        assert!(replay.is_finished());
        assert_eq!(replay.cursor(), 2);
        let frozen = body.position;
        let writes = body.position_writes;

        for step in 0..10 {
            let applied = replay.tick(1.0 + step as f32, DT, &mut body, &tuning);
            assert_eq!(applied, 0);
            assert_eq!(replay.cursor(), 2);
        }
        assert_eq!(body.position, frozen);
        assert_eq!(body.position_writes, writes);
    }

    #[test]
    fn test_cursor_never_goes_backwards() {
        let mut replay = GhostReplay::new(recording(&[0.0, 0.5, 1.0]), 0.0, ReconcileMode::Exact);
        let mut body = TestBody::default();
        let tuning = ReconcileTuning::default();
        replay.tick(0.6, DT, &mut body, &tuning);
        assert_eq!(replay.cursor(), 2);
        // A clock that jumps back applies nothing and keeps the cursor
        replay.tick(0.1, DT, &mut body, &tuning);
        assert_eq!(replay.cursor(), 2);
    }

    #[test]
    fn test_empty_recording_is_noop() {
        let mut replay = GhostReplay::new(Arc::new(Recording::empty()), 0.0, ReconcileMode::Physics);
        let mut body = TestBody {
            position: Vec3::new(3.0, 1.0, 0.0),
            ..default()
        };
        assert_eq!(replay.initial_position(), None);
        assert_eq!(replay.tick(4.0, DT, &mut body, &ReconcileTuning::default()), 0);
        assert!(replay.is_finished());
        assert!(replay.last_applied().is_none());
        assert_eq!(body.position, Vec3::new(3.0, 1.0, 0.0));
        assert!(body.poses.is_empty());
    }

    #[test]
    fn test_exact_mode_sets_position_keeps_depth() {
        let replay = GhostReplay::new(recording(&[0.0]), 0.0, ReconcileMode::Exact);
        let mut body = TestBody {
            position: Vec3::new(9.0, 9.0, 0.4),
            ..default()
        };
        let s = sample(0.0, 1.5);
        replay.apply(&s, DT, &mut body, &ReconcileTuning::default());
        assert_eq!(body.position, Vec3::new(1.5, 0.0, 0.4));
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_physics_teleport_keeps_velocity() {
        let replay = GhostReplay::new(recording(&[0.0]), 0.0, ReconcileMode::Physics);
        let mut body = TestBody {
            position: Vec3::new(-1.0, 0.0, 0.0),
            force: Vec2::new(3.0, 0.0),
            ..default()
        };
        let s = sample(0.0, 0.0);
        let correction = replay.apply(&s, DT, &mut body, &ReconcileTuning::default());
        assert_eq!(correction, Correction::Teleport);
        assert_eq!(body.position.truncate(), s.position.truncate());
        assert_eq!(body.velocity, s.velocity);
        // A force left by an earlier sample this tick does not survive the snap
        assert_eq!(body.force, Vec2::ZERO);
    }

    #[test]
    fn test_physics_small_drift_leaves_body_alone() {
        let replay = GhostReplay::new(recording(&[0.0]), 0.0, ReconcileMode::Physics);
        let mut body = TestBody {
            position: Vec3::new(0.05, 0.0, 0.0),
            force: Vec2::new(7.0, 7.0),
            ..default()
        };
        let correction = replay.apply(&sample(0.0, 0.0), DT, &mut body, &ReconcileTuning::default());
        assert_eq!(correction, Correction::None);
        assert_eq!(body.position_writes, 0);
        assert_eq!(body.force, Vec2::ZERO);
        assert_eq!(body.velocity, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_physics_mid_drift_sets_force() {
        let replay = GhostReplay::new(recording(&[0.0]), 0.0, ReconcileMode::Physics);
        let mut body = TestBody {
            position: Vec3::new(0.3, 0.0, 0.0),
            ..default()
        };
        let correction = replay.apply(&sample(0.0, 0.0), DT, &mut body, &ReconcileTuning::default());
        assert!(matches!(correction, Correction::Force(_)));
        assert!(body.force.x < 0.0);
        assert_eq!(body.position_writes, 0);
    }

    #[test]
    fn test_initialize_rewinds() {
        let mut replay = GhostReplay::new(recording(&[0.0, 0.1]), 0.0, ReconcileMode::Exact);
        let mut body = TestBody::default();
        replay.tick(1.0, DT, &mut body, &ReconcileTuning::default());
        assert!(replay.is_finished());

        replay.initialize(recording(&[0.0, 0.1, 0.2]), 10.0);
        assert_eq!(replay.cursor(), 0);
        assert_eq!(replay.loop_start_time(), 10.0);
        assert_eq!(replay.initial_position(), Some(Vec3::ZERO));
    }

    #[test]
    fn test_coarse_tick_ends_with_one_correction() {
        // Two samples land in one tick: the first pulls with a force, the
        // second is far enough to snap, which must clear that force.
        let rec = Arc::new(Recording::from_ordered(vec![
            sample(0.0, 0.3),
            sample(0.01, 2.0),
        ]));
        let mut replay = GhostReplay::new(rec, 0.0, ReconcileMode::Physics);
        let mut body = TestBody::default();
        let applied = replay.tick(0.02, DT, &mut body, &ReconcileTuning::default());

        assert_eq!(applied, 2);
        assert_eq!(replay.last_correction(), Correction::Teleport);
        assert_eq!(body.force, Vec2::ZERO);
        assert_eq!(body.position.x, 2.0);
        assert_eq!(replay.residual_drift(), 0.0);
    }

    #[test]
    fn test_residual_drift_bounded_by_teleport_threshold() {
        let tuning = ReconcileTuning::default();
        for start in [0.0, 0.05, 0.3, 0.5, 0.51, 3.0] {
            let mut replay = GhostReplay::new(recording(&[0.0]), 0.0, ReconcileMode::Physics);
            let mut body = TestBody {
                position: Vec3::new(start, 0.0, 0.0),
                ..default()
            };
            replay.tick(0.0, DT, &mut body, &tuning);
            assert!(
                replay.residual_drift() <= tuning.teleport_threshold,
                "start {} left {}",
                start,
                replay.residual_drift()
            );
        }
    }
}
