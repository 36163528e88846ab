//! Headless App Builder
//!
//! Provides a reusable builder for creating headless Bevy apps that run the
//! fixed tick without a window. Used by the simulation runner and ECS tests.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use crate::constants::TICK_HZ;
use crate::events::{EventBuffer, buffer_bus_events};
use crate::levels::{LevelDatabase, setup_level};
use crate::settings::LoopSettings;
use crate::tick::{add_tick_systems, insert_run_resources};
use crate::tuning::GameplayTuning;

/// Builder for creating headless Bevy apps
pub struct HeadlessAppBuilder {
    settings: LoopSettings,
    tuning: GameplayTuning,
    level_db: Option<LevelDatabase>,
    minimal_threads: bool,
    buffer_events: bool,
}

impl Default for HeadlessAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessAppBuilder {
    /// Create a new builder with default settings and the built-in level
    pub fn new() -> Self {
        Self {
            settings: LoopSettings {
                log_events: false,
                ..default()
            },
            tuning: GameplayTuning::default(),
            level_db: None,
            minimal_threads: false,
            buffer_events: true,
        }
    }

    /// Set the loop settings
    pub fn with_settings(mut self, settings: LoopSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the gameplay tuning
    pub fn with_tuning(mut self, tuning: GameplayTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Set the level database (default: the built-in level)
    pub fn with_level_db(mut self, level_db: LevelDatabase) -> Self {
        self.level_db = Some(level_db);
        self
    }

    /// Enable minimal thread mode (task pools = 1)
    ///
    /// Use this when running many apps in parallel to avoid hitting OS thread limits.
    pub fn with_minimal_threads(mut self) -> Self {
        self.minimal_threads = true;
        self
    }

    /// Leave bus events pending instead of moving them into an `EventBuffer`
    pub fn without_event_buffer(mut self) -> Self {
        self.buffer_events = false;
        self
    }

    /// Build the app.
    ///
    /// The returned app has:
    /// - MinimalPlugins with ScheduleRunnerPlugin and TransformPlugin
    /// - manual time, one fixed tick per `app.update()` after the first
    /// - run resources, the fixed tick systems and the level setup at Startup
    /// - an `EventBuffer` filled in `Last` unless disabled
    pub fn build(self) -> App {
        let tick = Duration::from_secs_f64(1.0 / TICK_HZ);
        let mut app = App::new();

        if self.minimal_threads {
            app.add_plugins(
                MinimalPlugins
                    .set(ScheduleRunnerPlugin::run_loop(tick))
                    .set(TaskPoolPlugin {
                        task_pool_options: TaskPoolOptions::with_num_threads(1),
                    }),
            );
        } else {
            app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(tick)));
        }
        app.add_plugins(bevy::transform::TransformPlugin);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(tick));

        let level_db = self.level_db.unwrap_or_else(LevelDatabase::default_levels);
        insert_run_resources(&mut app, self.settings, self.tuning, level_db);
        add_tick_systems(&mut app);
        app.add_systems(Startup, setup_level);

        if self.buffer_events {
            app.insert_resource(EventBuffer::new());
            app.add_systems(Last, buffer_bus_events);
        }

        app
    }
}
