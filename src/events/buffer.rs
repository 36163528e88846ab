//! In-memory event buffer for headless runs.

use bevy::prelude::*;
use uuid::Uuid;

use super::bus::EventBus;
use super::format::serialize_event;
use super::types::{GameConfig, GameEvent};

/// Simple in-memory event log (no file I/O).
#[derive(Resource, Default)]
pub struct EventBuffer {
    events: Vec<(u32, GameEvent)>,
    session_id: String,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session with a fresh UUID
    pub fn start_session(&mut self, timestamp: &str) {
        self.clear();
        self.session_id = Uuid::new_v4().to_string();
        self.events.push((
            0,
            GameEvent::SessionStart {
                session_id: self.session_id.clone(),
                timestamp: timestamp.to_string(),
            },
        ));
    }

    /// Log the run configuration
    pub fn log_config(&mut self, config: GameConfig) {
        self.events.push((0, GameEvent::Config(config)));
    }

    /// Get the current session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.session_id.clear();
    }

    pub fn events(&self) -> &[(u32, GameEvent)] {
        &self.events
    }

    /// Import events from an external source (like EventBus)
    pub fn import_events(&mut self, events: Vec<(u32, GameEvent)>) {
        self.events.extend(events);
    }

    /// Number of logged events matching a predicate
    pub fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|(_, e)| pred(e)).count()
    }

    /// Serialize all events to a log string
    pub fn serialize(&self) -> String {
        self.events
            .iter()
            .map(|(ts, e)| serialize_event(*ts, e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Move this frame's bus events into the buffer
pub fn buffer_bus_events(mut bus: ResMut<EventBus>, mut buffer: ResMut<EventBuffer>) {
    let events = bus.export_events();
    buffer.import_events(events);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_then_import() {
        let mut buffer = EventBuffer::new();
        buffer.start_session("20260101_120000");
        assert_eq!(buffer.session_id().len(), 36);

        let mut bus = EventBus::new();
        bus.emit(GameEvent::LoopStart {
            loop_index: 0,
            ghosts: 0,
        });
        buffer.import_events(bus.export_events());

        assert_eq!(buffer.events().len(), 2);
        assert_eq!(
            buffer.count(|e| matches!(e, GameEvent::LoopStart { .. })),
            1
        );
        let text = buffer.serialize();
        assert!(text.lines().nth(1).is_some_and(|l| l == "T:00000|LS|0|0"));
    }
}
