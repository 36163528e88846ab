//! Compact text format for event serialization
//!
//! Format: `T:NNNNN|CODE|data...`
//! - T:NNNNN = timestamp in milliseconds (5 digits, wraps at 99999)
//! - CODE = short event type code
//! - data = pipe-separated values specific to event type
//!
//! Examples:
//! ```text
//! T:00000|LS|0|0
//! T:00412|J|
//! T:08000|LE|0|513
//! T:08000|LS|1|1
//! T:09150|GI|0|3.2,-1.5|4.10
//! T:40000|GO|5
//! ```

use super::types::{GameConfig, GameEvent};

/// Format a position tuple
fn fmt_pos(pos: (f32, f32)) -> String {
    format!("{:.1},{:.1}", pos.0, pos.1)
}

/// Serialize a GameEvent to compact text format
pub fn serialize_event(time_ms: u32, event: &GameEvent) -> String {
    let ts = format!("T:{:05}", time_ms % 100000);
    let code = event.type_code();

    let data = match event {
        GameEvent::SessionStart {
            session_id,
            timestamp,
        } => format!("{}|{}", session_id, timestamp),
        GameEvent::Config(config) => {
            // Compact JSON so tooling can read it back whole
            serde_json::to_string(config).unwrap_or_else(|_| "{}".to_string())
        }
        GameEvent::LoopStart { loop_index, ghosts } => format!("{}|{}", loop_index, ghosts),
        GameEvent::LoopEnd {
            loop_index,
            samples,
        } => format!("{}|{}", loop_index, samples),
        GameEvent::GameOver { loops } => loops.to_string(),
        GameEvent::RunReset => String::new(),
        // Messages are free text; keep the line parseable
        GameEvent::ConfigError { message } => message.replace('|', "/"),
        GameEvent::AddTime { seconds } => format!("{:.2}", seconds),
        GameEvent::GhostImpact { ghost, pos, speed } => {
            format!("{}|{}|{:.2}", ghost, fmt_pos(*pos), speed)
        }
        GameEvent::GhostLost { ghost } => ghost.to_string(),
        GameEvent::Pickup | GameEvent::Drop | GameEvent::Jump | GameEvent::Land => String::new(),
        GameEvent::PlatePressed { plate } | GameEvent::PlateReleased { plate } => {
            plate.to_string()
        }
        GameEvent::DoorOpened { door } | GameEvent::DoorClosed { door } => door.to_string(),
    };

    format!("{}|{}|{}", ts, code, data)
}

/// Parse a line back into timestamp and event
pub fn parse_event(line: &str) -> Option<(u32, GameEvent)> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 3 {
        return None;
    }

    let ts_str = parts[0].strip_prefix("T:")?;
    let time_ms: u32 = ts_str.parse().ok()?;

    let code = parts[1];
    let data = &parts[2..];

    let event = match code {
        "SE" if data.len() >= 2 => GameEvent::SessionStart {
            session_id: data[0].to_string(),
            timestamp: data[1].to_string(),
        },
        "CF" => {
            let json_str = data.join("|");
            let config: GameConfig = serde_json::from_str(&json_str).ok()?;
            GameEvent::Config(config)
        }
        "LS" if data.len() >= 2 => GameEvent::LoopStart {
            loop_index: data[0].parse().ok()?,
            ghosts: data[1].parse().ok()?,
        },
        "LE" if data.len() >= 2 => GameEvent::LoopEnd {
            loop_index: data[0].parse().ok()?,
            samples: data[1].parse().ok()?,
        },
        "GO" => GameEvent::GameOver {
            loops: data[0].parse().ok()?,
        },
        "RR" => GameEvent::RunReset,
        "CE" => GameEvent::ConfigError {
            message: data.join("|"),
        },
        "AT" => GameEvent::AddTime {
            seconds: data[0].parse().ok()?,
        },
        "GI" if data.len() >= 3 => GameEvent::GhostImpact {
            ghost: data[0].parse().ok()?,
            pos: parse_pos(data[1])?,
            speed: data[2].parse().ok()?,
        },
        "GL" => GameEvent::GhostLost {
            ghost: data[0].parse().ok()?,
        },
        "PU" => GameEvent::Pickup,
        "DR" => GameEvent::Drop,
        "J" => GameEvent::Jump,
        "LD" => GameEvent::Land,
        "P+" => GameEvent::PlatePressed {
            plate: data[0].parse().ok()?,
        },
        "P-" => GameEvent::PlateReleased {
            plate: data[0].parse().ok()?,
        },
        "D+" => GameEvent::DoorOpened {
            door: data[0].parse().ok()?,
        },
        "D-" => GameEvent::DoorClosed {
            door: data[0].parse().ok()?,
        },
        _ => return None,
    };

    Some((time_ms, event))
}

fn parse_pos(s: &str) -> Option<(f32, f32)> {
    let (x, y) = s.split_once(',')?;
    Some((x.parse().ok()?, y.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_events_parse_back() {
        let line = serialize_event(8000, &GameEvent::LoopEnd {
            loop_index: 0,
            samples: 513,
        });
        assert_eq!(line, "T:08000|LE|0|513");
        let (ts, parsed) = parse_event(&line).unwrap();
        assert_eq!(ts, 8000);
        assert_eq!(parsed, GameEvent::LoopEnd {
            loop_index: 0,
            samples: 513,
        });
    }

    #[test]
    fn test_ghost_impact_precision() {
        let event = GameEvent::GhostImpact {
            ghost: 2,
            pos: (3.24, -1.51),
            speed: 4.1234,
        };
        let line = serialize_event(9150, &event);
        assert_eq!(line, "T:09150|GI|2|3.2,-1.5|4.12");
        let (_, parsed) = parse_event(&line).unwrap();
        if let GameEvent::GhostImpact { ghost, pos, speed } = parsed {
            assert_eq!(ghost, 2);
            assert!((pos.0 - 3.2).abs() < 0.01);
            assert!((speed - 4.12).abs() < 0.01);
        } else {
            panic!("Wrong event type");
        }
    }

    #[test]
    fn test_empty_payload_events() {
        let line = serialize_event(412, &GameEvent::Jump);
        assert_eq!(line, "T:00412|J|");
        assert_eq!(parse_event(&line), Some((412, GameEvent::Jump)));
        assert_eq!(
            parse_event(&serialize_event(0, &GameEvent::RunReset)),
            Some((0, GameEvent::RunReset))
        );
    }

    #[test]
    fn test_config_error_message_with_pipe() {
        let event = GameEvent::ConfigError {
            message: "no spawn point | level 'x'".to_string(),
        };
        let (_, parsed) = parse_event(&serialize_event(0, &event)).unwrap();
        assert_eq!(parsed, GameEvent::ConfigError {
            message: "no spawn point / level 'x'".to_string(),
        });
    }

    #[test]
    fn test_config_snapshot() {
        let config = GameConfig {
            level: "Intro".to_string(),
            loop_duration: 8.0,
            max_loops: 5,
            game_ends_after_max_loops: true,
            ghost_mode: "physics".to_string(),
            teleport_threshold: 0.5,
            correction_threshold: 0.1,
            fidelity_gain: 5.0,
        };
        let line = serialize_event(0, &GameEvent::Config(config.clone()));
        assert!(line.starts_with("T:00000|CF|{"));
        assert_eq!(parse_event(&line), Some((0, GameEvent::Config(config))));
    }

    #[test]
    fn test_garbage_lines_rejected() {
        assert!(parse_event("").is_none());
        assert!(parse_event("T:abc|LS|0|0").is_none());
        assert!(parse_event("T:00010|ZZ|1").is_none());
        assert!(parse_event("T:00010|LS|x|0").is_none());
    }
}
