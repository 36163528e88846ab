//! Pressure plates

use bevy::prelude::*;

/// Plate activation change for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateChange {
    Activated,
    Deactivated,
}

/// Floor switch pressed by the player, ghosts and boxes.
///
/// Occupancy is recounted every tick. A plate that does not need constant
/// pressure starts its release timer only when the last occupant steps off, and
/// stepping back on cancels the timer.
#[derive(Component, Debug, Clone)]
pub struct PressurePlate {
    pub id: u32,
    /// Seconds a released plate stays active (timed plates only)
    pub activation_time: f32,
    /// Never deactivates once pressed
    pub stays_pressed: bool,
    /// Deactivates as soon as nothing is on it
    pub requires_constant_pressure: bool,
    /// Doors notified on every change
    pub doors: Vec<u32>,
    /// Trigger area (center, half extents), independent of the pressed visual
    pub area: (Vec2, Vec2),
    occupants: usize,
    activated: bool,
    released_at: Option<f32>,
}

impl PressurePlate {
    pub fn new(id: u32, center: Vec2, size: Vec2) -> Self {
        Self {
            id,
            activation_time: 3.0,
            stays_pressed: false,
            requires_constant_pressure: true,
            doors: Vec::new(),
            area: (center, size / 2.0),
            occupants: 0,
            activated: false,
            released_at: None,
        }
    }

    /// Release behavior: timed, latching or constant pressure
    pub fn with_release(
        mut self,
        activation_time: f32,
        stays_pressed: bool,
        requires_constant_pressure: bool,
    ) -> Self {
        self.activation_time = activation_time;
        self.stays_pressed = stays_pressed;
        self.requires_constant_pressure = requires_constant_pressure;
        self
    }

    pub fn with_doors(mut self, doors: Vec<u32>) -> Self {
        self.doors = doors;
        self
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn occupants(&self) -> usize {
        self.occupants
    }

    /// Feed this tick's occupant count
    pub fn update(&mut self, occupants: usize, now: f32) -> Option<PlateChange> {
        let previous = self.occupants;
        self.occupants = occupants;

        if occupants > 0 {
            self.released_at = None;
            if self.activated {
                return None;
            }
            self.activated = true;
            return Some(PlateChange::Activated);
        }

        if !self.activated || self.stays_pressed {
            return None;
        }
        if self.requires_constant_pressure {
            return Some(self.deactivate());
        }

        if previous > 0 {
            self.released_at = Some(now);
        }
        match self.released_at {
            Some(released) if now - released > self.activation_time => Some(self.deactivate()),
            _ => None,
        }
    }

    /// Clear the plate for a fresh level or run
    pub fn reset(&mut self) {
        self.occupants = 0;
        self.activated = false;
        self.released_at = None;
    }

    fn deactivate(&mut self) -> PlateChange {
        self.activated = false;
        self.released_at = None;
        PlateChange::Deactivated
    }
}
