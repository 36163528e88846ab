//! Impact flashes where ghosts hit the world

use bevy::prelude::*;

use crate::constants::*;
use crate::events::{EventBus, GameEvent};
use crate::tuning::GameplayTuning;

/// Seconds an impact flash stays on screen
const IMPACT_FLASH_TIME: f32 = 0.25;
/// Flash size at the weakest reported impact
const IMPACT_FLASH_SIZE: f32 = 0.4;

/// Short-lived sprite marking a ghost impact
#[derive(Component)]
pub struct ImpactFlash {
    pub timer: f32, // Time remaining in flash
    pub duration: f32,
}

/// Flash size grows with impact speed, capped at double the base size
pub fn impact_flash_size(speed: f32, min_impact_speed: f32) -> f32 {
    let ratio = if min_impact_speed > 0.0 {
        speed / min_impact_speed
    } else {
        1.0
    };
    IMPACT_FLASH_SIZE * ratio.clamp(1.0, 2.0)
}

/// Spawn a flash for each impact raised this frame
pub fn spawn_impact_flashes(
    mut commands: Commands,
    bus: Res<EventBus>,
    tuning: Res<GameplayTuning>,
) {
    for event in bus.peek() {
        let GameEvent::GhostImpact { pos, speed, .. } = &event.event else {
            continue;
        };
        let size = impact_flash_size(*speed, tuning.min_impact_speed);
        commands.spawn((
            Sprite::from_color(IMPACT_COLOR, Vec2::splat(size)),
            Transform::from_xyz(pos.0, pos.1, 3.0),
            ImpactFlash {
                timer: IMPACT_FLASH_TIME,
                duration: IMPACT_FLASH_TIME,
            },
        ));
    }
}

/// Fade flashes out and despawn them when done
pub fn animate_impact_flashes(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Sprite, &mut ImpactFlash)>,
) {
    for (entity, mut sprite, mut flash) in &mut query {
        flash.timer -= time.delta_secs();

        if flash.timer <= 0.0 {
            commands.entity(entity).despawn();
        } else {
            let alpha = flash.timer / flash.duration;
            sprite.color = IMPACT_COLOR.with_alpha(alpha);
        }
    }
}
