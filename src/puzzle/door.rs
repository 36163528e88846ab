//! Doors opened by plates and switch groups

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Distance at which a moving door snaps onto its target
pub const DOOR_SNAP_DISTANCE: f32 = 0.01;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorDirection {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl DoorDirection {
    pub fn unit(&self) -> Vec2 {
        match self {
            DoorDirection::Up => Vec2::Y,
            DoorDirection::Down => Vec2::NEG_Y,
            DoorDirection::Left => Vec2::NEG_X,
            DoorDirection::Right => Vec2::X,
        }
    }
}

/// Sliding door. Solid while closed, passable while open.
#[derive(Component, Debug, Clone)]
pub struct Door {
    pub id: u32,
    pub open_direction: DoorDirection,
    pub open_distance: f32,
    pub open_speed: f32,
    closed_position: Vec2,
    start_closed: bool,
    is_open: bool,
}

impl Door {
    pub fn new(id: u32, closed_position: Vec2, start_closed: bool) -> Self {
        Self {
            id,
            open_direction: DoorDirection::Up,
            open_distance: 2.0,
            open_speed: 2.0,
            closed_position,
            start_closed,
            is_open: !start_closed,
        }
    }

    /// How far, which way and how fast the door slides open
    pub fn with_motion(mut self, direction: DoorDirection, distance: f32, speed: f32) -> Self {
        self.open_direction = direction;
        self.open_distance = distance;
        self.open_speed = speed;
        self
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn open_position(&self) -> Vec2 {
        self.closed_position + self.open_direction.unit() * self.open_distance
    }

    pub fn target(&self) -> Vec2 {
        if self.is_open {
            self.open_position()
        } else {
            self.closed_position
        }
    }

    /// Open. Returns true if the door was closed.
    pub fn activate(&mut self) -> bool {
        let changed = !self.is_open;
        self.is_open = true;
        changed
    }

    /// Close. Returns true if the door was open.
    pub fn deactivate(&mut self) -> bool {
        let changed = self.is_open;
        self.is_open = false;
        changed
    }

    pub fn toggle(&mut self) -> bool {
        if self.is_open {
            self.deactivate()
        } else {
            self.activate()
        }
    }

    /// Back to the level's initial state
    pub fn reset(&mut self) {
        self.is_open = !self.start_closed;
    }

    /// Ease `current` toward the target over `dt`
    pub fn step(&self, current: Vec2, dt: f32) -> Vec2 {
        let target = self.target();
        if current.distance(target) <= DOOR_SNAP_DISTANCE {
            return target;
        }
        current.lerp(target, (dt * self.open_speed).min(1.0))
    }
}
