//! Ghost entities: spawning, playback, impacts and fall-out

use bevy::prelude::*;

use super::reconcile::ReconcileMode;
use super::replay::{GhostReplay, ReplayBody};
use crate::constants::*;
use crate::events::{EventBus, GameEvent};
use crate::helpers::ghost_alpha;
use crate::loops::GhostSpawn;
use crate::player::Velocity;
use crate::recording::{ActionSample, AnimationState};
use crate::tuning::GameplayTuning;
use crate::world::{Body, ContactReport, CorrectiveForce, Dormant, Kinematic, PlateActivator};

/// A replaying past loop
#[derive(Component, Debug)]
pub struct Ghost {
    /// Index of the recording in the past recording store
    pub recording_index: usize,
}

/// Presentation state from the last applied sample
#[derive(Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct GhostPose {
    pub grounded: bool,
    pub velocity: Vec2,
    pub facing_right: bool,
    pub animation: AnimationState,
    pub holding_box: bool,
}

impl GhostPose {
    pub fn from_sample(sample: &ActionSample) -> Self {
        Self {
            grounded: !sample.is_jumping,
            velocity: sample.velocity,
            facing_right: sample.is_facing_right,
            animation: sample.animation,
            holding_box: sample.is_holding_box,
        }
    }
}

/// Box drawn over a ghost whose recording was carrying one
#[derive(Component)]
pub struct GhostBoxIndicator;

/// Ghost components seen through the replay seam
struct GhostBody<'a> {
    transform: &'a mut Transform,
    velocity: &'a mut Velocity,
    force: &'a mut CorrectiveForce,
    pose: &'a mut GhostPose,
    mass: f32,
}

impl ReplayBody for GhostBody<'_> {
    fn position(&self) -> Vec3 {
        self.transform.translation
    }

    fn set_position(&mut self, position: Vec3) {
        self.transform.translation = position;
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity.0 = velocity;
    }

    fn set_corrective_force(&mut self, force: Vec2) {
        self.force.0 = force;
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn set_pose(&mut self, sample: &ActionSample) {
        *self.pose = GhostPose::from_sample(sample);
    }
}

/// Spawn one ghost for a stored recording.
///
/// The ghost starts on the recording's first sample, or on the spawn point if the
/// recording is empty (it then stays put for the whole loop).
pub fn spawn_ghost(
    commands: &mut Commands,
    spawn: &GhostSpawn,
    mode: ReconcileMode,
    tuning: &GameplayTuning,
) -> Entity {
    let replay = GhostReplay::new(spawn.recording.clone(), spawn.loop_start_time, mode);
    let start = replay.initial_position().unwrap_or(spawn.spawn_point);
    if spawn.recording.is_empty() {
        debug!(
            "Ghost {} has an empty recording, holding at spawn",
            spawn.recording_index
        );
    }

    let age = spawn.total.saturating_sub(spawn.recording_index + 1);
    let alpha = ghost_alpha(age);
    // Older ghosts draw behind newer ones
    let z = 1.0 + spawn.recording_index as f32 * 0.01;

    let mut entity = commands.spawn((
        Sprite::from_color(GHOST_COLOR.with_alpha(alpha), PLAYER_SIZE),
        Transform::from_xyz(start.x, start.y, z),
        Ghost {
            recording_index: spawn.recording_index,
        },
        replay,
        GhostPose::default(),
        Velocity::default(),
        Body::new(PLAYER_SIZE, tuning.ghost_mass, tuning.ghost_linear_damping),
        CorrectiveForce::default(),
        ContactReport::default(),
        PlateActivator,
    ));
    if mode == ReconcileMode::Exact {
        entity.insert(Kinematic);
    }
    entity.with_children(|parent| {
        parent.spawn((
            GhostBoxIndicator,
            Sprite::from_color(BOX_COLOR.with_alpha(alpha), BOX_SIZE),
            Transform::from_xyz(HOLD_OFFSET.x, HOLD_OFFSET.y, 0.1),
            Visibility::Hidden,
        ));
    });
    entity.id()
}

/// Advance every active ghost through its recording
pub fn ghost_playback(
    time: Res<Time>,
    tuning: Res<GameplayTuning>,
    mut ghosts: Query<
        (
            &mut GhostReplay,
            &mut Transform,
            &mut Velocity,
            &mut CorrectiveForce,
            &mut GhostPose,
            &Body,
        ),
        (With<Ghost>, Without<Dormant>),
    >,
) {
    let now = time.elapsed_secs();
    let dt = time.delta_secs();
    let reconcile = tuning.reconcile();

    for (mut replay, mut transform, mut velocity, mut force, mut pose, body) in &mut ghosts {
        if replay.is_finished() {
            continue;
        }
        let mut ghost_body = GhostBody {
            transform: &mut *transform,
            velocity: &mut *velocity,
            force: &mut *force,
            pose: &mut *pose,
            mass: body.mass,
        };
        replay.tick(now, dt, &mut ghost_body, &reconcile);
    }
}

/// Raise an impact event for the hardest collision each ghost had this tick
pub fn report_ghost_impacts(
    tuning: Res<GameplayTuning>,
    mut bus: ResMut<EventBus>,
    ghosts: Query<(&Ghost, &ContactReport), Without<Dormant>>,
) {
    for (ghost, report) in &ghosts {
        let Some(hardest) = report
            .contacts
            .iter()
            .filter(|c| c.speed > tuning.min_impact_speed)
            .max_by(|a, b| a.speed.total_cmp(&b.speed))
        else {
            continue;
        };
        bus.emit(GameEvent::GhostImpact {
            ghost: ghost.recording_index,
            pos: (hardest.point.x, hardest.point.y),
            speed: hardest.speed,
        });
    }
}

/// Take ghosts that fell out of the world out of the simulation.
/// The entity stays until its loop ends; the store is not touched.
pub fn deactivate_fallen_ghosts(
    mut commands: Commands,
    tuning: Res<GameplayTuning>,
    mut bus: ResMut<EventBus>,
    ghosts: Query<(Entity, &Ghost, &Transform), (Without<Dormant>, Without<Kinematic>)>,
) {
    for (entity, ghost, transform) in &ghosts {
        if transform.translation.y >= tuning.fall_limit_y {
            continue;
        }
        debug!(
            "Ghost {} fell out of the world at {:.1}, deactivating",
            ghost.recording_index, transform.translation.x
        );
        commands
            .entity(entity)
            .insert((Dormant, Visibility::Hidden));
        bus.emit(GameEvent::GhostLost {
            ghost: ghost.recording_index,
        });
    }
}

/// Flip ghost sprites by facing and show the carried box
pub fn update_ghost_visuals(
    mut ghosts: Query<(&GhostPose, &mut Sprite), (With<Ghost>, Changed<GhostPose>)>,
    poses: Query<&GhostPose>,
    mut indicators: Query<(&ChildOf, &mut Visibility), With<GhostBoxIndicator>>,
) {
    for (pose, mut sprite) in &mut ghosts {
        sprite.flip_x = !pose.facing_right;
    }
    for (child_of, mut visibility) in &mut indicators {
        let holding = poses
            .get(child_of.parent())
            .is_ok_and(|pose| pose.holding_box);
        let wanted = if holding {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        visibility.set_if_neq(wanted);
    }
}
