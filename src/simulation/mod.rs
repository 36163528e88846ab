//! Headless simulation - run whole loop sequences without a window
//!
//! A scripted player drives the live player while ghosts replay, collecting
//! per-loop drift and puzzle metrics.

pub mod app_builder;
pub mod config;
pub mod metrics;
pub mod runner;

pub use app_builder::HeadlessAppBuilder;
pub use config::SimConfig;
pub use metrics::{LoopSummary, RunSummary, SimMetrics, collect_sim_metrics, track_ghost_drift};
pub use runner::{ScriptedPlayer, drive_scripted_player, init_parallel, run_once, run_simulation};
