//! Player physics systems

use bevy::prelude::*;

use crate::constants::*;
use crate::events::{EventBus, GameEvent};
use crate::helpers::*;
use crate::input::PlayerInput;
use crate::player::components::*;
use crate::recording::{AnimationState, PlayerSnapshot};
use crate::tuning::GameplayTuning;
use crate::world::{Body, Collider, Held, PickupBox, collect_solids, resolve_aabb, shove_box};

/// Runs in FixedUpdate to apply captured input to physics.
pub fn apply_input(
    tuning: Res<GameplayTuning>,
    mut input: ResMut<PlayerInput>,
    mut bus: ResMut<EventBus>,
    mut players: Query<
        (
            &mut Velocity,
            &mut JumpPhase,
            &mut Facing,
            &Grounded,
            &Carrier,
            &ControlEnabled,
        ),
        With<Player>,
    >,
    time: Res<Time>,
) {
    let dt = time.delta_secs();

    for (mut velocity, mut phase, mut facing, grounded, carrier, control) in &mut players {
        let move_x = if control.0 { input.move_x } else { 0.0 };

        // Acceleration-based horizontal movement
        let target_speed = move_x * carrier.max_speed(tuning.carry_speed_factor);
        let current_speed = velocity.0.x;

        // Accelerating toward input, or decelerating (stopping/reversing)
        let has_input = move_x.abs() > STICK_DEADZONE;
        let same_direction =
            target_speed.signum() == current_speed.signum() || current_speed.abs() < 1.0;
        let is_accelerating = has_input && same_direction;

        let rate = match (grounded.0, is_accelerating) {
            (true, true) => tuning.ground_accel,
            (true, false) => tuning.ground_decel,
            (false, true) => tuning.air_accel,
            (false, false) => tuning.air_decel,
        };

        velocity.0.x = move_toward(current_speed, target_speed, rate * dt);

        // Facing follows input, not velocity, so turning feels responsive
        if move_x > STICK_DEADZONE {
            facing.0 = 1.0;
        } else if move_x < -STICK_DEADZONE {
            facing.0 = -1.0;
        }

        if !control.0 {
            input.jump_buffer_timer = 0.0;
        }

        step_jump_phase(&mut phase, grounded.0, &mut bus);

        if input.jump_buffer_timer > 0.0
            && grounded.0
            && matches!(*phase, JumpPhase::Grounded | JumpPhase::Landed)
        {
            *phase = JumpPhase::PrepareToJump;
        }

        if *phase == JumpPhase::PrepareToJump {
            velocity.0.y = tuning.jump_velocity;
            input.jump_buffer_timer = 0.0;
            *phase = JumpPhase::Jumping;
            bus.emit(GameEvent::Jump);
        }

        // Variable jump height: cut velocity if released while rising
        if input.jump_released
            && velocity.0.y > 0.0
            && matches!(*phase, JumpPhase::Jumping | JumpPhase::InFlight)
        {
            velocity.0.y *= JUMP_CUT_MULTIPLIER;
        }
        input.jump_released = false;
    }
}

/// Advance the jump lifecycle from the grounded flag of the previous tick
fn step_jump_phase(phase: &mut JumpPhase, grounded: bool, bus: &mut EventBus) {
    match *phase {
        JumpPhase::Jumping if !grounded => *phase = JumpPhase::InFlight,
        JumpPhase::InFlight if grounded => {
            *phase = JumpPhase::Landed;
            bus.emit(GameEvent::Land);
        }
        JumpPhase::Landed => *phase = JumpPhase::Grounded,
        _ => {}
    }
}

/// Apply gravity to player
pub fn apply_gravity(
    tuning: Res<GameplayTuning>,
    mut query: Query<(&mut Velocity, &Grounded), With<Player>>,
    time: Res<Time>,
) {
    for (mut velocity, grounded) in &mut query {
        if !grounded.0 {
            // Fast fall: use higher gravity when falling than rising
            let gravity = if velocity.0.y > 0.0 {
                tuning.gravity_rise
            } else {
                tuning.gravity_fall
            };
            velocity.0.y -= gravity * time.delta_secs();
        }
    }
}

/// Integrate player position
pub fn move_player(mut query: Query<(&mut Transform, &Velocity), With<Player>>, time: Res<Time>) {
    let dt = time.delta_secs();
    for (mut transform, velocity) in &mut query {
        transform.translation.x += velocity.0.x * dt;
        transform.translation.y += velocity.0.y * dt;
    }
}

/// Check player collisions with solids, pushing and standing on boxes
#[allow(clippy::type_complexity)]
pub fn check_collisions(
    mut player_query: Query<
        (&mut Transform, &mut Velocity, &mut Grounded, &Body),
        (With<Player>, Without<PickupBox>),
    >,
    solids: Query<(&Transform, &Collider), (Without<Body>, Without<Player>)>,
    mut boxes: Query<
        (&mut Transform, &mut Velocity, &Body),
        (With<PickupBox>, Without<Held>, Without<Player>),
    >,
) {
    let solids = collect_solids(&solids);

    for (mut transform, mut velocity, mut grounded, body) in &mut player_query {
        // Assume not grounded until we find a floor beneath us
        grounded.0 = false;

        for (solid_pos, solid_half) in &solids {
            let contact = resolve_aabb(
                &mut transform.translation,
                &mut velocity.0,
                body.half_extents,
                *solid_pos,
                *solid_half,
            );
            if contact.is_some_and(|c| c.normal == Vec2::Y) {
                grounded.0 = true;
            }
        }

        for (mut box_tf, mut box_vel, box_body) in &mut boxes {
            shove_box(
                transform.translation.truncate(),
                body.half_extents,
                velocity.0,
                &mut box_tf.translation,
                &mut box_vel.0,
                box_body.half_extents,
                &solids,
            );
            let contact = resolve_aabb(
                &mut transform.translation,
                &mut velocity.0,
                body.half_extents,
                box_tf.translation.truncate(),
                box_body.half_extents,
            );
            if contact.is_some_and(|c| c.normal == Vec2::Y) {
                grounded.0 = true;
            }
        }
    }
}

/// Observable player state for the recorder (animation resolved here)
pub fn snapshot_player(
    transform: &Transform,
    velocity: &Velocity,
    phase: &JumpPhase,
    grounded: &Grounded,
    facing: &Facing,
    carrier: &Carrier,
) -> PlayerSnapshot {
    let animation = if *phase == JumpPhase::Landed {
        AnimationState::Landing
    } else if !grounded.0 {
        if velocity.0.y > 0.0 {
            AnimationState::Rising
        } else {
            AnimationState::Falling
        }
    } else if velocity.0.x.abs() > 0.1 {
        AnimationState::Running
    } else {
        AnimationState::Idle
    };

    PlayerSnapshot {
        position: transform.translation,
        velocity: velocity.0,
        is_jumping: *phase == JumpPhase::InFlight,
        is_facing_right: facing.is_right(),
        animation,
        is_holding_box: carrier.is_carrying(),
    }
}

/// Move the player to `position` and bring it to rest (keeps its draw depth)
pub fn teleport_player(
    transform: &mut Transform,
    velocity: &mut Velocity,
    phase: &mut JumpPhase,
    position: Vec3,
) {
    transform.translation = position.truncate().extend(transform.translation.z);
    velocity.0 = Vec2::ZERO;
    *phase = JumpPhase::Grounded;
}

/// Spawn the live player at `position`
pub fn spawn_player(commands: &mut Commands, position: Vec3, tuning: &GameplayTuning) -> Entity {
    commands
        .spawn((
            Sprite::from_color(PLAYER_COLOR, PLAYER_SIZE),
            Transform::from_xyz(position.x, position.y, 2.0),
            Player,
            Velocity::default(),
            Grounded::default(),
            JumpPhase::default(),
            Facing::default(),
            ControlEnabled::default(),
            Carrier::new(tuning.move_speed),
            Body::new(PLAYER_SIZE, 1.0, 0.0),
            crate::world::PlateActivator,
        ))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_phase_lifecycle() {
        let mut bus = EventBus::new();
        let mut phase = JumpPhase::Jumping;

        step_jump_phase(&mut phase, true, &mut bus);
        assert_eq!(phase, JumpPhase::Jumping);
        step_jump_phase(&mut phase, false, &mut bus);
        assert_eq!(phase, JumpPhase::InFlight);
        step_jump_phase(&mut phase, false, &mut bus);
        assert_eq!(phase, JumpPhase::InFlight);
        step_jump_phase(&mut phase, true, &mut bus);
        assert_eq!(phase, JumpPhase::Landed);
        step_jump_phase(&mut phase, true, &mut bus);
        assert_eq!(phase, JumpPhase::Grounded);

        let events: Vec<_> = bus.drain().into_iter().map(|e| e.event).collect();
        assert_eq!(events, vec![GameEvent::Land]);
    }

    #[test]
    fn test_snapshot_animation() {
        let transform = Transform::from_xyz(1.0, 2.0, 2.0);
        let facing = Facing(-1.0);
        let carrier = Carrier::new(MOVE_SPEED);

        let airborne = snapshot_player(
            &transform,
            &Velocity(Vec2::new(0.0, 3.0)),
            &JumpPhase::InFlight,
            &Grounded(false),
            &facing,
            &carrier,
        );
        assert_eq!(airborne.animation, AnimationState::Rising);
        assert!(airborne.is_jumping);
        assert!(!airborne.is_facing_right);

        let falling = snapshot_player(
            &transform,
            &Velocity(Vec2::new(0.0, -3.0)),
            &JumpPhase::Grounded,
            &Grounded(false),
            &facing,
            &carrier,
        );
        assert_eq!(falling.animation, AnimationState::Falling);
        // Walking off a ledge is not a jump
        assert!(!falling.is_jumping);

        let running = snapshot_player(
            &transform,
            &Velocity(Vec2::new(4.0, 0.0)),
            &JumpPhase::Grounded,
            &Grounded(true),
            &facing,
            &carrier,
        );
        assert_eq!(running.animation, AnimationState::Running);

        let landing = snapshot_player(
            &transform,
            &Velocity(Vec2::ZERO),
            &JumpPhase::Landed,
            &Grounded(true),
            &facing,
            &carrier,
        );
        assert_eq!(landing.animation, AnimationState::Landing);
        assert_eq!(landing.position, Vec3::new(1.0, 2.0, 2.0));
    }

    #[test]
    fn test_teleport_rests_player() {
        let mut transform = Transform::from_xyz(5.0, 5.0, 2.0);
        let mut velocity = Velocity(Vec2::new(3.0, -8.0));
        let mut phase = JumpPhase::InFlight;
        teleport_player(
            &mut transform,
            &mut velocity,
            &mut phase,
            Vec3::new(-4.0, 1.0, 0.0),
        );
        assert_eq!(transform.translation, Vec3::new(-4.0, 1.0, 2.0));
        assert_eq!(velocity.0, Vec2::ZERO);
        assert_eq!(phase, JumpPhase::Grounded);
    }
}
