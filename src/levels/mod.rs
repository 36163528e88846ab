//! Levels module - database, spawning, and hot reload

mod database;
mod spawning;

pub use database::*;
pub use spawning::*;

use bevy::prelude::*;

use crate::constants::LEVELS_FILE;
use crate::loops::LoopScheduler;
use crate::player::spawn_player;
use crate::settings::LoopSettings;
use crate::tuning::GameplayTuning;

/// Spawn the configured level and the player, then queue the first loop
pub fn setup_level(
    mut commands: Commands,
    level_db: Res<LevelDatabase>,
    settings: Res<LoopSettings>,
    tuning: Res<GameplayTuning>,
    mut scheduler: ResMut<LoopScheduler>,
) {
    let spawn_point = match level_db.find_or_first(&settings.level) {
        Some(level) => spawn_level(&mut commands, level, &tuning),
        None => {
            warn!("No levels loaded");
            None
        }
    };
    // The first loop start teleports the player onto the spawn point
    spawn_player(&mut commands, spawn_point.unwrap_or(Vec3::ZERO), &tuning);
    scheduler.set_spawn_point(spawn_point);
    scheduler.request_start();
}

/// Hot reload levels from file (F2)
pub fn reload_levels(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut commands: Commands,
    mut level_db: ResMut<LevelDatabase>,
    settings: Res<LoopSettings>,
    tuning: Res<GameplayTuning>,
    mut scheduler: ResMut<LoopScheduler>,
    level_entities: Query<Entity, With<LevelEntity>>,
) {
    if !keyboard.just_pressed(KeyCode::F2) {
        return;
    }

    *level_db = LevelDatabase::load_from_file(LEVELS_FILE);
    info!("Reloaded levels from {}", LEVELS_FILE);
    apply_level_reload(
        &mut commands,
        &level_db,
        &settings,
        &tuning,
        &mut scheduler,
        level_entities.iter(),
    );
}

/// Respawn the configured level and restart loops on its spawn point
pub fn apply_level_reload(
    commands: &mut Commands,
    level_db: &LevelDatabase,
    settings: &LoopSettings,
    tuning: &GameplayTuning,
    scheduler: &mut LoopScheduler,
    to_despawn: impl IntoIterator<Item = Entity>,
) {
    let Some(level) = level_db.find_or_first(&settings.level) else {
        return;
    };
    let spawn_point = reload_level(commands, level, tuning, to_despawn);
    scheduler.set_spawn_point(spawn_point);
    // Old ghosts were recorded against the old layout
    scheduler.request_reset();
}
