//! Level spawning helpers

use bevy::prelude::*;

use crate::constants::*;
use crate::levels::database::LevelData;
use crate::puzzle::{Door, PressurePlate, SwitchGroup, spawn_door, spawn_plate, spawn_switch_group};
use crate::tuning::GameplayTuning;
use crate::world::{spawn_box, spawn_platform};

/// Everything spawned from level data (despawned on reload)
#[derive(Component)]
pub struct LevelEntity;

/// Spawn a level's geometry, boxes and puzzle pieces.
/// Returns the level's spawn point, if it has one.
pub fn spawn_level(
    commands: &mut Commands,
    level: &LevelData,
    tuning: &GameplayTuning,
) -> Option<Vec3> {
    for platform in &level.platforms {
        let entity = spawn_platform(
            commands,
            Vec2::new(platform.x, platform.y),
            Vec2::new(platform.width, platform.height),
            PLATFORM_COLOR,
        );
        commands.entity(entity).insert(LevelEntity);
    }

    for [x, y] in &level.boxes {
        let entity = spawn_box(commands, Vec2::new(*x, *y), tuning);
        commands.entity(entity).insert(LevelEntity);
    }

    for def in &level.plates {
        let size = Vec2::new(def.width, PLATE_HEIGHT);
        let center = Vec2::new(def.x, def.y + PLATE_HEIGHT / 2.0);
        let plate = PressurePlate::new(def.id, center, size)
            .with_release(
                def.activation_time,
                def.stays_pressed,
                def.requires_constant_pressure,
            )
            .with_doors(def.doors.clone());
        let entity = spawn_plate(commands, plate);
        commands.entity(entity).insert(LevelEntity);
    }

    for def in &level.doors {
        let door = Door::new(def.id, Vec2::new(def.x, def.y), def.start_closed).with_motion(
            def.open_direction,
            def.open_distance,
            def.open_speed,
        );
        let entity = spawn_door(commands, door, Vec2::new(def.width, def.height));
        commands.entity(entity).insert(LevelEntity);
    }

    for def in &level.switch_groups {
        let entity = spawn_switch_group(
            commands,
            SwitchGroup {
                plates: def.plates.clone(),
                door: def.door,
                require_all: def.require_all,
                required_count: def.required_count,
            },
        );
        commands.entity(entity).insert(LevelEntity);
    }

    let spawn_point = level.spawn_point();
    if spawn_point.is_none() {
        warn!("Level '{}' has no spawn point", level.name);
    }
    info!(
        "Spawned level '{}': {} platforms, {} boxes, {} plates, {} doors",
        level.name,
        level.platforms.len(),
        level.boxes.len(),
        level.plates.len(),
        level.doors.len()
    );
    spawn_point
}

/// Despawn old level entities and spawn `level` in their place
pub fn reload_level(
    commands: &mut Commands,
    level: &LevelData,
    tuning: &GameplayTuning,
    to_despawn: impl IntoIterator<Item = Entity>,
) -> Option<Vec3> {
    for entity in to_despawn {
        commands.entity(entity).despawn();
    }
    spawn_level(commands, level, tuning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::LevelDatabase;
    use crate::world::{Collider, PickupBox, Platform};

    #[test]
    fn test_spawn_default_level() {
        let mut world = World::new();
        let db = LevelDatabase::default_levels();
        let spawn = {
            let mut commands = world.commands();
            spawn_level(&mut commands, &db.levels[0], &GameplayTuning::default())
        };
        world.flush();

        assert_eq!(spawn, Some(Vec3::new(-10.0, -5.5, 0.0)));
        let platforms = world.query::<&Platform>().iter(&world).count();
        assert_eq!(platforms, 4);
        let boxes = world.query::<&PickupBox>().iter(&world).count();
        assert_eq!(boxes, 1);

        let mut doors = world.query::<(&Door, &Collider)>();
        let (door, collider) = doors.single(&world).unwrap();
        assert!(!door.is_open());
        assert!(collider.enabled);

        let mut plates = world.query::<&PressurePlate>();
        let plate = plates.single(&world).unwrap();
        assert_eq!(plate.doors, vec![1]);
        assert!((plate.area.0.y - (-6.4)).abs() < 1e-5);

        let tagged = world.query::<&LevelEntity>().iter(&world).count();
        assert_eq!(tagged, 4 + 1 + 1 + 1);
    }

    #[test]
    fn test_spawned_puzzle_keeps_level_settings() {
        let mut world = World::new();
        let db = LevelDatabase::parse(include_str!("../../assets/levels.toml")).unwrap();
        let level = db.find("Timed Gate").unwrap();
        {
            let mut commands = world.commands();
            spawn_level(&mut commands, level, &GameplayTuning::default());
        }
        world.flush();

        let mut plates = world.query::<&PressurePlate>();
        let plate = plates.single(&world).unwrap();
        assert!(!plate.requires_constant_pressure);
        assert!(!plate.stays_pressed);
        assert_eq!(plate.activation_time, 4.0);
        assert_eq!(plate.doors, vec![1]);
        assert!(!plate.is_activated());

        let mut doors = world.query::<&Door>();
        let door = doors.single(&world).unwrap();
        assert_eq!(door.open_direction, crate::puzzle::DoorDirection::Down);
        assert_eq!(door.open_distance, 3.0);
        assert_eq!(door.open_speed, 2.0);
        assert!(!door.is_open());
        assert_eq!(door.open_position(), Vec2::new(6.0, -8.0));
    }
}
