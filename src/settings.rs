//! Loop settings for a run
//!
//! Loaded from config/loop_settings.json and overridden from the command line.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::*;
use crate::events::GameConfig;
use crate::ghost::ReconcileMode;
use crate::loops::{LoopConfig, LoopError};
use crate::tuning::GameplayTuning;

/// Path to the settings file
pub const SETTINGS_FILE: &str = "config/loop_settings.json";

/// Run settings. Missing fields keep their defaults.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopSettings {
    /// Seconds per loop
    pub loop_duration: f32,
    /// Loops per run (>= 1)
    pub max_loops: usize,
    /// Stop after the last loop, or wipe the ghosts and keep going
    pub game_ends_after_max_loops: bool,
    /// Seconds the game over banner stays up before the restart prompt
    pub game_over_delay: f32,
    /// Reconciliation policy for new ghosts
    pub ghost_mode: ReconcileMode,
    /// Level name to load (empty = first level)
    pub level: String,
    /// Write a session event log
    pub log_events: bool,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            loop_duration: LOOP_DURATION,
            max_loops: MAX_LOOPS,
            game_ends_after_max_loops: true,
            game_over_delay: GAME_OVER_DELAY,
            ghost_mode: ReconcileMode::Physics,
            level: String::new(),
            log_events: true,
        }
    }
}

impl LoopSettings {
    pub fn from_file(path: &str) -> Result<Self, String> {
        let contents =
            fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))
    }

    /// Load settings from file, or return defaults if it is missing or broken
    pub fn load() -> Self {
        if !Path::new(SETTINGS_FILE).exists() {
            info!("No {} found, using defaults", SETTINGS_FILE);
            return Self::default();
        }
        match Self::from_file(SETTINGS_FILE) {
            Ok(settings) => {
                info!("Loaded settings from {}", SETTINGS_FILE);
                settings
            }
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load the settings file, then apply command line overrides
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut settings = Self::load();
        settings.apply_args(&args);
        settings
    }

    /// Apply `--level`, `--loops`, `--duration`, `--exact-ghosts`, `--endless`, `--no-log`.
    /// `args[0]` is the program name. Unknown flags are ignored.
    pub fn apply_args(&mut self, args: &[String]) {
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--level" => {
                    if i + 1 < args.len() {
                        self.level = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--loops" => {
                    if i + 1 < args.len() {
                        match args[i + 1].parse() {
                            Ok(n) => self.max_loops = n,
                            Err(_) => warn!("Ignoring --loops {}", args[i + 1]),
                        }
                        i += 1;
                    }
                }
                "--duration" => {
                    if i + 1 < args.len() {
                        match args[i + 1].parse() {
                            Ok(secs) => self.loop_duration = secs,
                            Err(_) => warn!("Ignoring --duration {}", args[i + 1]),
                        }
                        i += 1;
                    }
                }
                "--exact-ghosts" => self.ghost_mode = ReconcileMode::Exact,
                "--endless" => self.game_ends_after_max_loops = false,
                "--no-log" => self.log_events = false,
                _ => {}
            }
            i += 1;
        }
    }

    /// Validated scheduler configuration
    pub fn loop_config(&self) -> Result<LoopConfig, LoopError> {
        LoopConfig::new(
            self.loop_duration,
            self.max_loops,
            self.game_ends_after_max_loops,
        )
    }

    /// Validated scheduler configuration, or the defaults when invalid
    pub fn loop_config_or_default(&self) -> LoopConfig {
        self.loop_config().unwrap_or_else(|e| {
            warn!("{}, using default loop settings", e);
            LoopConfig::default()
        })
    }

    /// Snapshot for the session log
    pub fn game_config(&self, level: &str, tuning: &GameplayTuning) -> GameConfig {
        GameConfig {
            level: level.to_string(),
            loop_duration: self.loop_duration,
            max_loops: self.max_loops,
            game_ends_after_max_loops: self.game_ends_after_max_loops,
            ghost_mode: self.ghost_mode.name().to_string(),
            teleport_threshold: tuning.teleport_threshold,
            correction_threshold: tuning.correction_threshold,
            fidelity_gain: tuning.fidelity_gain,
        }
    }
}
