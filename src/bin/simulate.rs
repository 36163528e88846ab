//! Timeloop Simulation Tool - headless loop runs with a scripted player
//!
//! Runs the loop scheduler without rendering and prints a JSON summary of
//! every loop (ghost counts, drift, corrections, puzzle activity).
//!
//! Usage:
//!   cargo run --bin simulate -- --help
//!   cargo run --bin simulate -- --loops 3 --duration 4 --seed 42
//!   cargo run --bin simulate -- --compare --runs 8 --parallel 4

use timeloop::constants::LEVELS_FILE;
use timeloop::levels::LevelDatabase;
use timeloop::simulation::{SimConfig, init_parallel, run_simulation};

fn main() {
    let config = SimConfig::from_args();
    if let Err(e) = init_parallel(config.parallel) {
        eprintln!("Warning: {}", e);
    }

    let level_db = LevelDatabase::load_from_file(LEVELS_FILE);
    if !config.quiet {
        eprintln!(
            "Running {} run(s) per mode, {} loops of {:.1}s",
            config.runs.max(1),
            config.settings.max_loops,
            config.settings.loop_duration
        );
    }

    let results = run_simulation(&config, &level_db);

    if !config.quiet {
        for result in &results {
            eprintln!(
                "{:>8} seed {:<20} loops {} max drift {:.3} teleports {}{}",
                result.ghost_mode,
                result.seed,
                result.loops.len(),
                result.max_drift(),
                result.total_teleports(),
                if result.game_over { "" } else { " (cut short)" }
            );
        }
    }

    let json = match serde_json::to_string_pretty(&results) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to serialize results: {}", e);
            std::process::exit(1);
        }
    };
    match &config.output_file {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &json) {
                eprintln!("Failed to write {}: {}", path, e);
                std::process::exit(1);
            }
            if !config.quiet {
                eprintln!("Results written to {}", path);
            }
        }
        None => println!("{}", json),
    }
}
