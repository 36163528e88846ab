//! Recorded player samples and finalized recordings.

use bevy::prelude::*;

/// Fixed set of animation states a recorded actor can be in.
///
/// Resolved once from the player's jump phase and velocity when the sample is
/// taken, so replay never has to query the renderer for what it supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AnimationState {
    #[default]
    Idle,
    Running,
    Rising,
    Falling,
    Landing,
}

impl AnimationState {
    pub const ALL: [AnimationState; 5] = [
        AnimationState::Idle,
        AnimationState::Running,
        AnimationState::Rising,
        AnimationState::Falling,
        AnimationState::Landing,
    ];

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            AnimationState::Idle => "idle",
            AnimationState::Running => "run",
            AnimationState::Rising => "rise",
            AnimationState::Falling => "fall",
            AnimationState::Landing => "land",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.name() == name)
    }
}

/// Observable state of the live player at the end of a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerSnapshot {
    pub position: Vec3,
    pub velocity: Vec2,
    pub is_jumping: bool,
    pub is_facing_right: bool,
    pub animation: AnimationState,
    pub is_holding_box: bool,
}

/// One captured moment of a loop attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionSample {
    /// Seconds since the loop started
    pub t_offset: f32,
    pub position: Vec3,
    pub velocity: Vec2,
    pub is_jumping: bool,
    pub is_facing_right: bool,
    pub animation: AnimationState,
    pub is_holding_box: bool,
}

impl ActionSample {
    pub fn from_snapshot(t_offset: f32, snapshot: &PlayerSnapshot) -> Self {
        Self {
            t_offset,
            position: snapshot.position,
            velocity: snapshot.velocity,
            is_jumping: snapshot.is_jumping,
            is_facing_right: snapshot.is_facing_right,
            animation: snapshot.animation,
            is_holding_box: snapshot.is_holding_box,
        }
    }
}

/// The finalized action stream of one loop attempt.
///
/// Only the recorder can build one, and it never hands out mutable access, so
/// samples stay in nondecreasing `t_offset` order for the life of the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    samples: Vec<ActionSample>,
}

impl Recording {
    /// An empty recording (what `end` returns when nothing was recorded)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Finalize a sample buffer. Callers guarantee ordering.
    pub(crate) fn from_ordered(samples: Vec<ActionSample>) -> Self {
        debug_assert!(
            samples.windows(2).all(|w| w[0].t_offset <= w[1].t_offset),
            "recording samples out of order"
        );
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ActionSample> {
        self.samples.get(index)
    }

    pub fn samples(&self) -> &[ActionSample] {
        &self.samples
    }

    pub fn first(&self) -> Option<&ActionSample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&ActionSample> {
        self.samples.last()
    }

    /// Time offset of the last sample (0 for an empty recording)
    pub fn duration(&self) -> f32 {
        self.samples.last().map(|s| s.t_offset).unwrap_or(0.0)
    }

    /// Number of samples whose timestamp has elapsed at `playback_time`
    pub fn samples_elapsed(&self, playback_time: f32) -> usize {
        self.samples.partition_point(|s| s.t_offset <= playback_time)
    }

    /// Total path length traced by the recorded positions
    pub fn path_length(&self) -> f32 {
        self.samples
            .windows(2)
            .map(|w| w[0].position.truncate().distance(w[1].position.truncate()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_at(t: f32, x: f32) -> ActionSample {
        ActionSample::from_snapshot(
            t,
            &PlayerSnapshot {
                position: Vec3::new(x, 0.0, 0.0),
                ..default()
            },
        )
    }

    #[test]
    fn test_samples_elapsed_is_step_lookup() {
        let rec = Recording::from_ordered(vec![
            sample_at(0.0, 0.0),
            sample_at(0.016, 1.0),
            sample_at(0.033, 2.0),
        ]);
        assert_eq!(rec.samples_elapsed(-0.1), 0);
        assert_eq!(rec.samples_elapsed(0.0), 1);
        assert_eq!(rec.samples_elapsed(0.02), 2);
        assert_eq!(rec.samples_elapsed(1.0), 3);
    }

    #[test]
    fn test_duration_and_path_length() {
        let rec = Recording::from_ordered(vec![sample_at(0.0, 0.0), sample_at(0.5, 3.0)]);
        assert_eq!(rec.duration(), 0.5);
        assert!((rec.path_length() - 3.0).abs() < 1e-6);
        assert_eq!(Recording::empty().duration(), 0.0);
    }

    #[test]
    fn test_animation_names_roundtrip() {
        for state in AnimationState::ALL {
            assert_eq!(AnimationState::from_name(state.name()), Some(state));
        }
        assert_eq!(AnimationState::from_name("dance"), None);
    }
}
