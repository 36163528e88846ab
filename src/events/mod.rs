//! Session event log
//!
//! Provides a compact text format for logging loop lifecycle, ghost and puzzle
//! events. The EventBus carries them between modules; the EventLogger writes
//! them to disk and the EventBuffer keeps them in memory for headless runs.

mod buffer;
mod bus;
mod format;
mod logger;
mod types;

pub use buffer::{EventBuffer, buffer_bus_events};
pub use bus::{BusEvent, EventBus, update_event_bus_time};
pub use format::{parse_event, serialize_event};
pub use logger::{EventLogConfig, EventLogger, flush_event_log};
pub use types::{GameConfig, GameEvent};
