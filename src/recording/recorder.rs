//! Action recorder - captures the live player's state once per tick

use bevy::prelude::*;

use super::sample::{ActionSample, PlayerSnapshot, Recording};
use crate::player::{Carrier, Facing, Grounded, JumpPhase, Player, Velocity, snapshot_player};

/// Records the live player while a loop is running.
#[derive(Resource, Debug, Default)]
pub struct ActionRecorder {
    samples: Vec<ActionSample>,
    loop_start_time: f32,
    recording: bool,
}

impl ActionRecorder {
    /// Start a fresh recording. Calling this while already recording restarts.
    pub fn begin(&mut self, loop_start_time: f32) {
        self.samples.clear();
        self.loop_start_time = loop_start_time;
        self.recording = true;
    }

    /// Append the resolved player state for this tick.
    ///
    /// Offsets never run backwards: a clock that reports an earlier time than the
    /// previous sample is clamped to the previous offset.
    pub fn sample(&mut self, current_time: f32, state: &PlayerSnapshot) {
        if !self.recording {
            return;
        }
        let floor = self.samples.last().map(|s| s.t_offset).unwrap_or(0.0);
        let t_offset = (current_time - self.loop_start_time).max(floor);
        self.samples.push(ActionSample::from_snapshot(t_offset, state));
    }

    /// Stop recording and hand over everything captured since `begin`.
    pub fn end(&mut self) -> Recording {
        if !self.recording {
            return Recording::empty();
        }
        self.recording = false;
        Recording::from_ordered(std::mem::take(&mut self.samples))
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn loop_start_time(&self) -> f32 {
        self.loop_start_time
    }
}

/// Sample the live player after its physics has resolved for the tick.
pub fn record_player_actions(
    time: Res<Time>,
    mut recorder: ResMut<ActionRecorder>,
    players: Query<
        (
            &Transform,
            &Velocity,
            &JumpPhase,
            &Grounded,
            &Facing,
            &Carrier,
        ),
        With<Player>,
    >,
) {
    if !recorder.is_recording() {
        return;
    }
    let now = time.elapsed_secs();
    for (transform, velocity, phase, grounded, facing, carrier) in &players {
        let snapshot = snapshot_player(transform, velocity, phase, grounded, facing, carrier);
        recorder.sample(now, &snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32) -> PlayerSnapshot {
        PlayerSnapshot {
            position: Vec3::new(x, 1.0, 0.0),
            is_facing_right: true,
            ..default()
        }
    }

    #[test]
    fn test_begin_sample_end() {
        let mut recorder = ActionRecorder::default();
        recorder.begin(10.0);
        recorder.sample(10.0, &at(0.0));
        recorder.sample(10.5, &at(1.0));
        let rec = recorder.end();

        assert_eq!(rec.len(), 2);
        assert_eq!(rec.samples()[0].t_offset, 0.0);
        assert_eq!(rec.samples()[1].t_offset, 0.5);
        assert_eq!(rec.samples()[1].position.x, 1.0);
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_end_without_begin_is_empty() {
        let mut recorder = ActionRecorder::default();
        assert!(recorder.end().is_empty());

        recorder.begin(0.0);
        recorder.sample(0.1, &at(0.0));
        let _ = recorder.end();
        // Second end has nothing left
        assert!(recorder.end().is_empty());
    }

    #[test]
    fn test_sample_ignored_when_not_recording() {
        let mut recorder = ActionRecorder::default();
        recorder.sample(1.0, &at(0.0));
        assert_eq!(recorder.sample_count(), 0);
    }

    #[test]
    fn test_begin_while_recording_restarts() {
        let mut recorder = ActionRecorder::default();
        recorder.begin(0.0);
        recorder.sample(0.1, &at(0.0));
        recorder.sample(0.2, &at(0.0));
        recorder.begin(5.0);
        assert_eq!(recorder.sample_count(), 0);
        recorder.sample(5.25, &at(2.0));
        let rec = recorder.end();
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.samples()[0].t_offset, 0.25);
    }

    #[test]
    fn test_offsets_never_decrease() {
        let mut recorder = ActionRecorder::default();
        recorder.begin(1.0);
        for now in [1.0, 1.1, 1.05, 0.5, 1.3, 1.3] {
            recorder.sample(now, &at(0.0));
        }
        let rec = recorder.end();
        assert!(
            rec.samples()
                .windows(2)
                .all(|w| w[0].t_offset <= w[1].t_offset)
        );
        assert!(rec.samples().iter().all(|s| s.t_offset >= 0.0));
    }
}
