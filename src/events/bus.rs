//! Per-frame event queue shared by every gameplay system
//!
//! Loop, ghost, player and puzzle systems emit into the bus during the fixed
//! tick. HUD, effects and metrics peek at what is pending; the session log (or
//! the headless buffer) drains it in `Last`, so nothing survives the frame.

use bevy::prelude::*;

use super::types::GameEvent;

/// A game event stamped with the fixed clock
#[derive(Debug, Clone)]
pub struct BusEvent {
    /// Milliseconds of fixed time when the event was raised
    pub time_ms: u32,
    pub event: GameEvent,
}

#[derive(Resource, Default)]
pub struct EventBus {
    pending: Vec<BusEvent>,
    clock_ms: u32,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp for events emitted from now on
    pub fn update_time(&mut self, elapsed_secs: f32) {
        self.clock_ms = (elapsed_secs * 1000.0) as u32;
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.pending.push(BusEvent {
            time_ms: self.clock_ms,
            event,
        });
    }

    /// Events raised since the last drain, oldest first
    pub fn peek(&self) -> &[BusEvent] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<BusEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Drain as `(time_ms, event)` pairs for an `EventBuffer`
    pub fn export_events(&mut self) -> Vec<(u32, GameEvent)> {
        self.drain()
            .into_iter()
            .map(|e| (e.time_ms, e.event))
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Keep bus timestamps on the fixed clock
pub fn update_event_bus_time(mut bus: ResMut<EventBus>, time: Res<Time>) {
    bus.update_time(time.elapsed_secs());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_stamps_and_drain_empties() {
        let mut bus = EventBus::new();
        bus.update_time(1.5);
        bus.emit(GameEvent::LoopStart {
            loop_index: 1,
            ghosts: 1,
        });

        assert_eq!(bus.pending_count(), 1);
        assert_eq!(bus.peek()[0].time_ms, 1500);

        let events = bus.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(bus.pending_count(), 0);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_export_keeps_order() {
        let mut bus = EventBus::new();
        bus.emit(GameEvent::Jump);
        bus.update_time(0.25);
        bus.emit(GameEvent::Land);

        let exported = bus.export_events();
        assert_eq!(exported, vec![(0, GameEvent::Jump), (250, GameEvent::Land)]);
        assert_eq!(bus.pending_count(), 0);
    }
}
