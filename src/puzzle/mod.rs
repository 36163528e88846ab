//! Puzzle pieces - pressure plates, doors and switch groups

mod door;
mod plate;

pub use door::{DOOR_SNAP_DISTANCE, Door, DoorDirection};
pub use plate::{PlateChange, PressurePlate};

use bevy::prelude::*;

use crate::constants::*;
use crate::events::{EventBus, GameEvent};
use crate::helpers::aabb_overlap;
use crate::world::{Body, Collider, Dormant, Held, PlateActivator};

/// Opens a door from the combined state of several plates
#[derive(Component, Debug, Clone)]
pub struct SwitchGroup {
    pub plates: Vec<u32>,
    pub door: u32,
    pub require_all: bool,
    /// Active plates needed when not all are required
    pub required_count: usize,
}

impl SwitchGroup {
    pub fn should_open(&self, active: usize) -> bool {
        if self.require_all {
            active == self.plates.len()
        } else {
            active >= self.required_count
        }
    }
}

/// Sprite child that sinks when its plate is pressed
#[derive(Component)]
pub struct PlateVisual;

// ============================================================================
// Spawning
// ============================================================================

pub fn spawn_plate(commands: &mut Commands, plate: PressurePlate) -> Entity {
    let (center, half) = plate.area;
    commands
        .spawn((
            Transform::from_xyz(center.x, center.y, 0.2),
            Visibility::default(),
            plate,
        ))
        .with_children(|parent| {
            parent.spawn((
                PlateVisual,
                Sprite::from_color(PLATE_OFF_COLOR, half * 2.0),
                Transform::default(),
            ));
        })
        .id()
}

pub fn spawn_door(commands: &mut Commands, door: Door, size: Vec2) -> Entity {
    let start = door.target();
    let mut collider = Collider::new(size);
    collider.enabled = !door.is_open();
    commands
        .spawn((
            Sprite::from_color(DOOR_COLOR, size),
            Transform::from_xyz(start.x, start.y, 0.1),
            door,
            collider,
        ))
        .id()
}

pub fn spawn_switch_group(commands: &mut Commands, group: SwitchGroup) -> Entity {
    commands.spawn(group).id()
}

// ============================================================================
// Systems
// ============================================================================

/// Count bodies on each plate and forward changes to connected doors
pub fn update_pressure_plates(
    time: Res<Time>,
    mut bus: ResMut<EventBus>,
    mut plates: Query<&mut PressurePlate>,
    mut doors: Query<&mut Door>,
    activators: Query<(&Transform, &Body), (With<PlateActivator>, Without<Dormant>, Without<Held>)>,
) {
    let now = time.elapsed_secs();
    let bodies: Vec<(Vec2, Vec2)> = activators
        .iter()
        .map(|(tf, body)| (tf.translation.truncate(), body.half_extents))
        .collect();

    for mut plate in &mut plates {
        let (center, half) = plate.area;
        let occupants = bodies
            .iter()
            .filter(|(pos, body_half)| aabb_overlap(*pos, *body_half, center, half).is_some())
            .count();

        let Some(change) = plate.update(occupants, now) else {
            continue;
        };
        let plate_id = plate.id;
        bus.emit(match change {
            PlateChange::Activated => GameEvent::PlatePressed { plate: plate_id },
            PlateChange::Deactivated => GameEvent::PlateReleased { plate: plate_id },
        });

        for mut door in &mut doors {
            if !plate.doors.contains(&door.id) {
                continue;
            }
            let changed = match change {
                PlateChange::Activated => door.activate(),
                PlateChange::Deactivated => door.deactivate(),
            };
            if changed {
                emit_door_change(&mut bus, &door);
            }
        }
    }
}

/// Open or close group doors from plate states
pub fn update_switch_groups(
    mut bus: ResMut<EventBus>,
    groups: Query<&SwitchGroup>,
    plates: Query<&PressurePlate>,
    mut doors: Query<&mut Door>,
) {
    for group in &groups {
        let active = plates
            .iter()
            .filter(|p| group.plates.contains(&p.id) && p.is_activated())
            .count();
        let open = group.should_open(active);

        for mut door in &mut doors {
            if door.id != group.door {
                continue;
            }
            let changed = if open {
                door.activate()
            } else {
                door.deactivate()
            };
            if changed {
                emit_door_change(&mut bus, &door);
            }
        }
    }
}

fn emit_door_change(bus: &mut EventBus, door: &Door) {
    bus.emit(if door.is_open() {
        GameEvent::DoorOpened { door: door.id }
    } else {
        GameEvent::DoorClosed { door: door.id }
    });
}

/// Slide doors toward their targets. Solidity follows the open state at once.
pub fn move_doors(time: Res<Time>, mut doors: Query<(&Door, &mut Transform, &mut Collider)>) {
    let dt = time.delta_secs();
    for (door, mut transform, mut collider) in &mut doors {
        let next = door.step(transform.translation.truncate(), dt);
        transform.translation.x = next.x;
        transform.translation.y = next.y;
        collider.enabled = !door.is_open();
    }
}

/// Color and sink pressed plates
pub fn update_plate_visuals(
    plates: Query<&PressurePlate>,
    mut visuals: Query<(&ChildOf, &mut Sprite, &mut Transform), With<PlateVisual>>,
) {
    for (child_of, mut sprite, mut transform) in &mut visuals {
        let Ok(plate) = plates.get(child_of.parent()) else {
            continue;
        };
        let (color, depth) = if plate.is_activated() {
            (PLATE_ON_COLOR, -PLATE_PRESS_DEPTH)
        } else {
            (PLATE_OFF_COLOR, 0.0)
        };
        if sprite.color != color {
            sprite.color = color;
            transform.translation.y = depth;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_group_rules() {
        let all = SwitchGroup {
            plates: vec![1, 2, 3],
            door: 9,
            require_all: true,
            required_count: 2,
        };
        assert!(!all.should_open(2));
        assert!(all.should_open(3));

        let some = SwitchGroup {
            require_all: false,
            ..all
        };
        assert!(!some.should_open(1));
        assert!(some.should_open(2));
    }
}
