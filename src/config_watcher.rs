//! Config file auto-reload system
//!
//! Polls config files every few seconds and reloads when modified.

use bevy::prelude::*;
use std::fs;
use std::time::SystemTime;

use crate::constants::LEVELS_FILE;
use crate::levels::{LevelDatabase, LevelEntity, apply_level_reload};
use crate::loops::LoopScheduler;
use crate::settings::LoopSettings;
use crate::tuning::{GAMEPLAY_TUNING_FILE, GameplayTuning, load_gameplay_tuning_from_file};

/// How often to check for config changes (seconds)
const CHECK_INTERVAL: f32 = 5.0;

/// Tracks modification times of config files for hot-reload
#[derive(Resource)]
pub struct ConfigWatcher {
    /// Time since last check
    pub timer: f32,
    /// Last known modification times
    pub levels_mtime: Option<SystemTime>,
    pub tuning_mtime: Option<SystemTime>,
}

impl Default for ConfigWatcher {
    fn default() -> Self {
        Self {
            timer: 0.0,
            levels_mtime: get_mtime(LEVELS_FILE),
            tuning_mtime: get_mtime(GAMEPLAY_TUNING_FILE),
        }
    }
}

/// Get file modification time, or None if file doesn't exist
fn get_mtime(path: &str) -> Option<SystemTime> {
    fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

/// Check for config file changes and reload as needed.
#[allow(clippy::too_many_arguments)]
pub fn check_config_changes(
    time: Res<Time>,
    mut watcher: ResMut<ConfigWatcher>,
    mut commands: Commands,
    mut level_db: ResMut<LevelDatabase>,
    mut tuning: ResMut<GameplayTuning>,
    settings: Res<LoopSettings>,
    mut scheduler: ResMut<LoopScheduler>,
    level_entities: Query<Entity, With<LevelEntity>>,
) {
    watcher.timer += time.delta_secs();

    if watcher.timer < CHECK_INTERVAL {
        return;
    }
    watcher.timer = 0.0;

    // Tuning first so a level reload spawns boxes with the new values
    let new_tuning_mtime = get_mtime(GAMEPLAY_TUNING_FILE);
    if new_tuning_mtime != watcher.tuning_mtime {
        watcher.tuning_mtime = new_tuning_mtime;
        match load_gameplay_tuning_from_file(GAMEPLAY_TUNING_FILE) {
            Ok(loaded) => {
                *tuning = loaded;
                info!("Auto-reloaded tuning from {}", GAMEPLAY_TUNING_FILE);
            }
            Err(err) => warn!("{}, keeping current tuning", err),
        }
    }

    let new_levels_mtime = get_mtime(LEVELS_FILE);
    if new_levels_mtime != watcher.levels_mtime {
        watcher.levels_mtime = new_levels_mtime;
        *level_db = LevelDatabase::load_from_file(LEVELS_FILE);
        info!("Auto-reloaded levels from {}", LEVELS_FILE);
        apply_level_reload(
            &mut commands,
            &level_db,
            &settings,
            &tuning,
            &mut scheduler,
            level_entities.iter(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_has_no_mtime() {
        assert!(get_mtime("config/does_not_exist.json").is_none());
    }
}
