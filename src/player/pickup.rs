//! Box pickup, carry and drop

use bevy::prelude::*;

use crate::constants::*;
use crate::events::{EventBus, GameEvent};
use crate::input::PlayerInput;
use crate::player::components::*;
use crate::tuning::GameplayTuning;
use crate::world::{Body, Held, PickupBox};

/// Nearest box in front of the player within `range` of its leading edge.
/// Boxes are `(entity, center, half extents)`; vertical overlap is required.
pub fn pickup_target(
    player_pos: Vec2,
    player_half: Vec2,
    facing: f32,
    range: f32,
    boxes: impl IntoIterator<Item = (Entity, Vec2, Vec2)>,
) -> Option<Entity> {
    boxes
        .into_iter()
        .filter_map(|(entity, pos, half)| {
            let dx = (pos.x - player_pos.x) * facing.signum();
            let gap = dx - player_half.x - half.x;
            let vertical = (pos.y - player_pos.y).abs() < player_half.y + half.y;
            (dx > 0.0 && gap <= range && vertical).then_some((entity, dx))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(entity, _)| entity)
}

/// Let go of the carried box where it is. Returns the released box.
pub fn release_box(commands: &mut Commands, carrier: &mut Carrier) -> Option<Entity> {
    let entity = carrier.carrying.take()?;
    if let Ok(mut box_commands) = commands.get_entity(entity) {
        box_commands.remove::<Held>();
    }
    Some(entity)
}

/// Pick up or drop a box on the pickup press
pub fn handle_pickup(
    mut commands: Commands,
    tuning: Res<GameplayTuning>,
    mut input: ResMut<PlayerInput>,
    mut bus: ResMut<EventBus>,
    mut players: Query<(&Transform, &Facing, &Body, &mut Carrier, &ControlEnabled), With<Player>>,
    mut boxes: Query<
        (Entity, &Transform, &mut Velocity, &Body),
        (With<PickupBox>, Without<Player>),
    >,
) {
    let pressed = input.pickup_pressed;
    input.consume_presses();
    if !pressed {
        return;
    }

    for (transform, facing, body, mut carrier, control) in &mut players {
        if !control.0 {
            continue;
        }

        if carrier.is_carrying() {
            let Some(entity) = release_box(&mut commands, &mut carrier) else {
                continue;
            };
            if let Ok((_, _, mut velocity, _)) = boxes.get_mut(entity) {
                velocity.0 = Vec2::new(facing.0 * DROP_VELOCITY.x, DROP_VELOCITY.y);
            }
            bus.emit(GameEvent::Drop);
            continue;
        }

        let target = pickup_target(
            transform.translation.truncate(),
            body.half_extents,
            facing.0,
            tuning.pickup_range,
            boxes
                .iter()
                .map(|(entity, tf, _, b)| (entity, tf.translation.truncate(), b.half_extents)),
        );
        let Some(entity) = target else {
            continue;
        };
        if let Ok((_, _, mut velocity, _)) = boxes.get_mut(entity) {
            velocity.0 = Vec2::ZERO;
        }
        commands.entity(entity).insert(Held);
        carrier.carrying = Some(entity);
        bus.emit(GameEvent::Pickup);
    }
}

/// Keep the carried box on the hold point above the player
pub fn carry_held_box(
    mut players: Query<(&Transform, &Facing, &mut Carrier), With<Player>>,
    mut boxes: Query<(&mut Transform, &mut Velocity), (With<PickupBox>, Without<Player>)>,
) {
    for (transform, facing, mut carrier) in &mut players {
        let Some(entity) = carrier.carrying else {
            continue;
        };
        let Ok((mut box_tf, mut box_vel)) = boxes.get_mut(entity) else {
            // Box went away with a level reload
            carrier.carrying = None;
            continue;
        };
        box_tf.translation.x = transform.translation.x + HOLD_OFFSET.x * facing.0;
        box_tf.translation.y = transform.translation.y + HOLD_OFFSET.y;
        box_vel.0 = Vec2::ZERO;
    }
}
