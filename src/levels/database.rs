//! Level database - parsing and storage

use bevy::prelude::*;
use serde::Deserialize;
use std::fs;

use crate::puzzle::DoorDirection;

/// Solid rectangle (center and size)
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PlatformDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    #[serde(default = "default_platform_height")]
    pub height: f32,
}

fn default_platform_height() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PlateDef {
    pub id: u32,
    pub x: f32,
    /// Floor height the plate sits on
    pub y: f32,
    #[serde(default = "default_plate_width")]
    pub width: f32,
    #[serde(default = "default_activation_time")]
    pub activation_time: f32,
    #[serde(default)]
    pub stays_pressed: bool,
    #[serde(default = "default_true")]
    pub requires_constant_pressure: bool,
    #[serde(default)]
    pub doors: Vec<u32>,
}

fn default_plate_width() -> f32 {
    1.2
}

fn default_activation_time() -> f32 {
    3.0
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DoorDef {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_door_width")]
    pub width: f32,
    #[serde(default = "default_door_height")]
    pub height: f32,
    #[serde(default)]
    pub open_direction: DoorDirection,
    #[serde(default = "default_door_height")]
    pub open_distance: f32,
    #[serde(default = "default_open_speed")]
    pub open_speed: f32,
    #[serde(default = "default_true")]
    pub start_closed: bool,
}

fn default_door_width() -> f32 {
    0.5
}

fn default_door_height() -> f32 {
    3.0
}

fn default_open_speed() -> f32 {
    2.0
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SwitchGroupDef {
    pub plates: Vec<u32>,
    pub door: u32,
    #[serde(default = "default_true")]
    pub require_all: bool,
    #[serde(default = "default_required_count")]
    pub required_count: usize,
}

fn default_required_count() -> usize {
    2
}

/// Single level definition
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LevelData {
    pub name: String,
    /// Where every loop starts. A level without one cannot run loops.
    #[serde(default)]
    pub spawn_point: Option<[f32; 2]>,
    #[serde(default, rename = "platform")]
    pub platforms: Vec<PlatformDef>,
    /// Box centers
    #[serde(default, rename = "box")]
    pub boxes: Vec<[f32; 2]>,
    #[serde(default, rename = "plate")]
    pub plates: Vec<PlateDef>,
    #[serde(default, rename = "door")]
    pub doors: Vec<DoorDef>,
    #[serde(default, rename = "switch_group")]
    pub switch_groups: Vec<SwitchGroupDef>,
}

impl LevelData {
    pub fn spawn_point(&self) -> Option<Vec3> {
        self.spawn_point.map(|[x, y]| Vec3::new(x, y, 0.0))
    }
}

#[derive(Deserialize)]
struct LevelFile {
    #[serde(default, rename = "level")]
    levels: Vec<LevelData>,
}

/// Database of all loaded levels
#[derive(Resource, Debug, Clone)]
pub struct LevelDatabase {
    pub levels: Vec<LevelData>,
}

impl Default for LevelDatabase {
    fn default() -> Self {
        Self::default_levels()
    }
}

impl LevelDatabase {
    /// Load levels from file, returns default hardcoded levels on error
    pub fn load_from_file(path: &str) -> Self {
        let parsed = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path, e))
            .and_then(|content| Self::parse(&content).map_err(|e| format!("{} in {}", e, path)));
        match parsed {
            Ok(db) => {
                info!("Loaded {} levels from {}", db.len(), path);
                db
            }
            Err(err) => {
                warn!("{}, using default levels", err);
                Self::default_levels()
            }
        }
    }

    /// Parse level data from a TOML string
    pub fn parse(content: &str) -> Result<Self, String> {
        let file: LevelFile =
            toml::from_str(content).map_err(|e| format!("Failed to parse levels: {}", e))?;
        if file.levels.is_empty() {
            return Err("No levels defined".to_string());
        }
        Ok(Self {
            levels: file.levels,
        })
    }

    /// Hardcoded fallback level: a floor, a ledge, a box and a plate-held door
    pub fn default_levels() -> Self {
        Self {
            levels: vec![LevelData {
                name: "Default".to_string(),
                spawn_point: Some([-10.0, -5.5]),
                platforms: vec![
                    PlatformDef {
                        x: 0.0,
                        y: -7.0,
                        width: 28.0,
                        height: 1.0,
                    },
                    PlatformDef {
                        x: 9.0,
                        y: -2.0,
                        width: 6.0,
                        height: 0.5,
                    },
                    PlatformDef {
                        x: -14.5,
                        y: 0.0,
                        width: 1.0,
                        height: 15.0,
                    },
                    PlatformDef {
                        x: 14.5,
                        y: 0.0,
                        width: 1.0,
                        height: 15.0,
                    },
                ],
                boxes: vec![[-4.0, -6.0]],
                plates: vec![PlateDef {
                    id: 1,
                    x: 0.0,
                    y: -6.5,
                    width: default_plate_width(),
                    activation_time: default_activation_time(),
                    stays_pressed: false,
                    requires_constant_pressure: true,
                    doors: vec![1],
                }],
                doors: vec![DoorDef {
                    id: 1,
                    x: 5.0,
                    y: -5.0,
                    width: default_door_width(),
                    height: default_door_height(),
                    open_direction: DoorDirection::Up,
                    open_distance: default_door_height(),
                    open_speed: default_open_speed(),
                    start_closed: true,
                }],
                switch_groups: Vec::new(),
            }],
        }
    }

    /// Get level by index
    pub fn get(&self, index: usize) -> Option<&LevelData> {
        self.levels.get(index)
    }

    /// Find a level by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&LevelData> {
        self.levels
            .iter()
            .find(|level| level.name.eq_ignore_ascii_case(name))
    }

    /// Named level, or the first one when the name is unknown
    pub fn find_or_first(&self, name: &str) -> Option<&LevelData> {
        self.find(name).or_else(|| {
            if !name.is_empty() {
                warn!("Unknown level '{}', using the first level", name);
            }
            self.levels.first()
        })
    }

    /// Get number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if database is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
