//! Simulation configuration

use serde::{Deserialize, Serialize};

use crate::ghost::ReconcileMode;
use crate::settings::LoopSettings;

/// Configuration for a batch of headless runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Loop settings shared by every run
    pub settings: LoopSettings,
    /// Number of seeded runs per ghost mode
    pub runs: u32,
    /// RNG seed for the scripted player (None = random)
    pub seed: Option<u64>,
    /// Run every seed once per ghost mode instead of only the configured one
    pub compare_modes: bool,
    /// Upper bound on fixed ticks per run (endless runs stop here)
    pub max_ticks: u64,
    /// Number of parallel threads (0 = sequential, N = N threads)
    pub parallel: usize,
    /// Output file path (None = stdout)
    pub output_file: Option<String>,
    /// Suppress progress output
    pub quiet: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            settings: LoopSettings {
                log_events: false,
                ..LoopSettings::default()
            },
            runs: 1,
            seed: None,
            compare_modes: false,
            max_ticks: 20_000,
            parallel: 0,
            output_file: None,
            quiet: false,
        }
    }
}

impl SimConfig {
    /// Parse configuration from command line arguments
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self {
            settings: LoopSettings::load(),
            ..Self::default()
        };
        // Headless runs only log when asked to
        config.settings.log_events = false;
        config.apply_args(&args);
        config
    }

    /// Apply the shared loop flags plus `--runs`, `--seed`, `--compare`,
    /// `--max-ticks`, `--parallel`, `--output`, `--quiet`.
    pub fn apply_args(&mut self, args: &[String]) {
        self.settings.apply_args(args);

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--runs" => {
                    if i + 1 < args.len() {
                        self.runs = args[i + 1].parse().unwrap_or(1);
                        i += 1;
                    }
                }
                "--seed" => {
                    if i + 1 < args.len() {
                        self.seed = args[i + 1].parse().ok();
                        i += 1;
                    }
                }
                "--max-ticks" => {
                    if i + 1 < args.len() {
                        self.max_ticks = args[i + 1].parse().unwrap_or(self.max_ticks);
                        i += 1;
                    }
                }
                "--parallel" => {
                    if i + 1 < args.len() {
                        self.parallel = args[i + 1].parse().unwrap_or(0);
                        i += 1;
                    }
                }
                "--output" | "-o" => {
                    if i + 1 < args.len() {
                        self.output_file = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--compare" => self.compare_modes = true,
                "--quiet" | "-q" => self.quiet = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// Ghost modes to run each seed with
    pub fn modes(&self) -> Vec<ReconcileMode> {
        if self.compare_modes {
            vec![ReconcileMode::Exact, ReconcileMode::Physics]
        } else {
            vec![self.settings.ghost_mode]
        }
    }
}

fn print_help() {
    println!(
        r#"Timeloop Simulation Tool

Runs the loop scheduler headless with a scripted player and prints a JSON
summary of every loop.

USAGE:
    cargo run --bin simulate -- [OPTIONS]

OPTIONS:
    --level <name>       Level to load (default: first level)
    --loops <n>          Loops per run
    --duration <secs>    Seconds per loop
    --exact-ghosts       Replay ghosts by position instead of physics
    --endless            Keep looping after the last loop
    --runs <n>           Seeded runs per ghost mode (default: 1)
    --seed <n>           Base RNG seed (default: random)
    --compare            Run every seed in both ghost modes
    --max-ticks <n>      Stop a run after this many fixed ticks
    --parallel <n>       Worker threads (0 = sequential)
    -o, --output <file>  Write JSON to a file instead of stdout
    -q, --quiet          Suppress progress output
    -h, --help           Show this help"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("simulate")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_sim_flags() {
        let mut config = SimConfig::default();
        config.apply_args(&args(&[
            "--runs", "4", "--seed", "99", "--compare", "--loops", "2", "-q",
        ]));
        assert_eq!(config.runs, 4);
        assert_eq!(config.seed, Some(99));
        assert!(config.quiet);
        assert_eq!(config.settings.max_loops, 2);
        assert_eq!(
            config.modes(),
            vec![ReconcileMode::Exact, ReconcileMode::Physics]
        );
    }

    #[test]
    fn test_single_mode_follows_settings() {
        let mut config = SimConfig::default();
        config.apply_args(&args(&["--exact-ghosts"]));
        assert_eq!(config.modes(), vec![ReconcileMode::Exact]);
    }
}
