//! Timeloop - a puzzle platformer where every past attempt replays as a ghost
//!
//! Main entry point: app setup and system registration.

use bevy::{camera::ScalingMode, prelude::*};

use timeloop::config_watcher::{ConfigWatcher, check_config_changes};
use timeloop::constants::*;
use timeloop::events::{EventLogConfig, EventLogger, flush_event_log};
use timeloop::ghost::update_ghost_visuals;
use timeloop::input::capture_input;
use timeloop::levels::{LevelDatabase, reload_levels, setup_level};
use timeloop::puzzle::update_plate_visuals;
use timeloop::settings::LoopSettings;
use timeloop::tick::{add_tick_systems, insert_run_resources};
use timeloop::tuning::{GameplayTuning, load_global_tuning};
use timeloop::ui::{
    HudMessages, animate_impact_flashes, collect_hud_messages, spawn_hud, spawn_impact_flashes,
    update_hud,
};

fn main() {
    // Settings file first, then command-line overrides
    let settings = LoopSettings::from_args();
    let tuning = load_global_tuning();
    let level_db = LevelDatabase::load_from_file(LEVELS_FILE);

    let log_config = EventLogConfig {
        enabled: settings.log_events,
        ..default()
    };

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            // Set scale_factor_override to 1.0 for consistent behavior on HiDPI displays
            resolution: bevy::window::WindowResolution::new(1280, 720)
                .with_scale_factor_override(1.0),
            title: "Timeloop".into(),
            resizable: false,
            ..default()
        }),
        ..default()
    }))
    .insert_resource(ClearColor(BACKGROUND_COLOR))
    .insert_resource(EventLogger::new(log_config))
    .init_resource::<ConfigWatcher>()
    .init_resource::<HudMessages>();

    insert_run_resources(&mut app, settings, tuning, level_db);
    add_tick_systems(&mut app);

    app.add_systems(Startup, (setup, setup_level, start_event_log))
        .add_systems(Update, (capture_input, reload_levels, check_config_changes))
        .add_systems(
            Update,
            (
                collect_hud_messages,
                update_hud,
                spawn_impact_flashes,
                animate_impact_flashes,
                update_ghost_visuals,
                update_plate_visuals,
            )
                .chain(),
        )
        .add_systems(Last, flush_event_log)
        .run();
}

fn setup(mut commands: Commands) {
    // Camera - orthographic, FixedVertical keeps the whole level height visible
    commands.spawn((
        Camera2d,
        Transform::from_xyz(0.0, 0.0, 0.0),
        Projection::Orthographic(OrthographicProjection {
            scaling_mode: ScalingMode::FixedVertical {
                viewport_height: VIEW_HEIGHT,
            },
            ..OrthographicProjection::default_2d()
        }),
    ));

    spawn_hud(&mut commands);
}

/// Open the session log and record the run configuration
fn start_event_log(
    mut logger: ResMut<EventLogger>,
    settings: Res<LoopSettings>,
    tuning: Res<GameplayTuning>,
    level_db: Res<LevelDatabase>,
) {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string();
    logger.start_session(&timestamp);

    let level_name = level_db
        .find_or_first(&settings.level)
        .map(|level| level.name.clone())
        .unwrap_or_default();
    logger.log_config(settings.game_config(&level_name, &tuning));
}
