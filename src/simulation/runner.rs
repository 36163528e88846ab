//! Headless simulation runner

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::constants::JUMP_BUFFER_TIME;
use crate::events::buffer_bus_events;
use crate::ghost::ReconcileMode;
use crate::input::PlayerInput;
use crate::levels::LevelDatabase;
use crate::settings::LoopSettings;
use crate::tick::TickSet;

use super::app_builder::HeadlessAppBuilder;
use super::config::SimConfig;
use super::metrics::{RunSummary, SimMetrics, collect_sim_metrics, track_ghost_drift};

/// Chance per tick that the scripted player starts a jump
const JUMP_CHANCE: f64 = 0.04;
/// Chance per tick that the scripted player presses pickup
const PICKUP_CHANCE: f64 = 0.01;

/// Seeded stand-in for a human at the keyboard
#[derive(Resource)]
pub struct ScriptedPlayer {
    rng: StdRng,
    move_x: f32,
    hold_ticks: u32,
    jump_ticks: u32,
}

impl ScriptedPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            move_x: 0.0,
            hold_ticks: 0,
            jump_ticks: 0,
        }
    }

    /// Advance the script one tick and write its intent into `input`
    pub fn step(&mut self, input: &mut PlayerInput, dt: f32) {
        if self.hold_ticks == 0 {
            self.move_x = match self.rng.gen_range(0..4) {
                0 => 0.0,
                1 => -1.0,
                _ => 1.0,
            };
            self.hold_ticks = self.rng.gen_range(16..96);
        }
        self.hold_ticks -= 1;
        input.move_x = self.move_x;

        input.jump_buffer_timer = (input.jump_buffer_timer - dt).max(0.0);
        if self.jump_ticks > 0 {
            self.jump_ticks -= 1;
            if self.jump_ticks == 0 {
                input.jump_held = false;
                input.jump_released = true;
            }
        } else if self.rng.gen_bool(JUMP_CHANCE) {
            input.jump_buffer_timer = JUMP_BUFFER_TIME;
            input.jump_held = true;
            self.jump_ticks = self.rng.gen_range(4..24);
        }

        if self.rng.gen_bool(PICKUP_CHANCE) {
            input.pickup_pressed = true;
        }
    }
}

/// Feed the scripted player's intent to the live player
pub fn drive_scripted_player(
    time: Res<Time>,
    mut script: ResMut<ScriptedPlayer>,
    mut input: ResMut<PlayerInput>,
) {
    script.step(&mut input, time.delta_secs());
}

/// Run one headless run until game over or `max_ticks`
pub fn run_once(
    settings: &LoopSettings,
    level_db: &LevelDatabase,
    seed: u64,
    max_ticks: u64,
) -> RunSummary {
    let mut app = HeadlessAppBuilder::new()
        .with_settings(settings.clone())
        .with_level_db(level_db.clone())
        .with_minimal_threads()
        .build();

    app.insert_resource(ScriptedPlayer::new(seed));
    app.insert_resource(SimMetrics::new());
    app.add_systems(
        FixedUpdate,
        (
            drive_scripted_player.in_set(TickSet::Control),
            track_ghost_drift.in_set(TickSet::World),
        ),
    );
    app.add_systems(Last, collect_sim_metrics.before(buffer_bus_events));

    app.finish();
    app.cleanup();

    // The first frame runs Startup and advances no time
    app.update();
    loop {
        app.update();
        let metrics = app.world().resource::<SimMetrics>();
        if metrics.game_over || metrics.ticks >= max_ticks {
            break;
        }
    }

    let metrics = app
        .world_mut()
        .remove_resource::<SimMetrics>()
        .unwrap_or_default();
    let level = level_db
        .find_or_first(&settings.level)
        .map(|level| level.name.clone())
        .unwrap_or_default();
    let ticks = metrics.ticks;
    let game_over = metrics.game_over;

    RunSummary {
        level,
        ghost_mode: settings.ghost_mode.name().to_string(),
        seed,
        loops: metrics.into_loops(),
        game_over,
        ticks,
        duration_secs: app.world().resource::<Time<Fixed>>().elapsed_secs(),
    }
}

/// Initialize the global worker pool with the given thread count.
/// Call this once at startup before running parallel simulations.
pub fn init_parallel(threads: usize) -> Result<(), String> {
    if threads == 0 {
        return Ok(());
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}

/// Run every (ghost mode, seed) pair the config asks for.
/// Results come back in mode order, then seed order.
pub fn run_simulation(config: &SimConfig, level_db: &LevelDatabase) -> Vec<RunSummary> {
    let base_seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen_range(0..u64::MAX));
    let jobs: Vec<(ReconcileMode, u64)> = config
        .modes()
        .into_iter()
        .flat_map(|mode| (0..config.runs.max(1)).map(move |i| (mode, base_seed.wrapping_add(i as u64))))
        .collect();

    info!("Running {} headless runs (base seed {})", jobs.len(), base_seed);

    let run_job = |&(mode, seed): &(ReconcileMode, u64)| {
        let settings = LoopSettings {
            ghost_mode: mode,
            ..config.settings.clone()
        };
        run_once(&settings, level_db, seed, config.max_ticks)
    };

    if config.parallel > 0 {
        jobs.par_iter().map(run_job).collect()
    } else {
        jobs.iter().map(run_job).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TELEPORT_THRESHOLD;
    use crate::events::{EventBuffer, GameEvent};
    use crate::levels::LevelData;
    use crate::loops::{LoopPhase, LoopScheduler};

    fn short_run(loops: usize, mode: ReconcileMode) -> LoopSettings {
        LoopSettings {
            loop_duration: 1.0,
            max_loops: loops,
            ghost_mode: mode,
            log_events: false,
            ..default()
        }
    }

    #[test]
    fn test_scripted_player_is_seeded() {
        let mut a = ScriptedPlayer::new(7);
        let mut b = ScriptedPlayer::new(7);
        let mut input_a = PlayerInput::default();
        let mut input_b = PlayerInput::default();
        for _ in 0..200 {
            a.step(&mut input_a, 1.0 / 64.0);
            b.step(&mut input_b, 1.0 / 64.0);
            assert_eq!(input_a.move_x, input_b.move_x);
            assert_eq!(input_a.jump_held, input_b.jump_held);
        }
    }

    #[test]
    fn test_full_run_reaches_game_over() {
        let summary = run_once(
            &short_run(3, ReconcileMode::Physics),
            &LevelDatabase::default_levels(),
            1,
            1_000,
        );

        assert!(summary.game_over);
        assert_eq!(summary.loops.len(), 3);
        let ghosts: Vec<usize> = summary.loops.iter().map(|l| l.ghosts).collect();
        assert_eq!(ghosts, vec![0, 1, 2]);
        for summary in &summary.loops {
            assert!((60..=70).contains(&summary.samples), "{}", summary.samples);
        }
        assert!(
            summary.max_drift() <= TELEPORT_THRESHOLD,
            "{}",
            summary.max_drift()
        );
    }

    #[test]
    fn test_exact_ghost_stays_on_path() {
        let summary = run_once(
            &short_run(2, ReconcileMode::Exact),
            &LevelDatabase::default_levels(),
            3,
            1_000,
        );

        assert!(summary.game_over);
        assert_eq!(summary.ghost_mode, "exact");
        assert!(summary.max_drift() < 1e-4, "{}", summary.max_drift());
        assert_eq!(summary.total_teleports(), 0);
    }

    #[test]
    fn test_missing_spawn_point_stays_idle() {
        let level_db = LevelDatabase {
            levels: vec![LevelData {
                name: "Void".to_string(),
                spawn_point: None,
                platforms: Vec::new(),
                boxes: Vec::new(),
                plates: Vec::new(),
                doors: Vec::new(),
                switch_groups: Vec::new(),
            }],
        };
        let mut app = HeadlessAppBuilder::new()
            .with_level_db(level_db)
            .with_minimal_threads()
            .build();
        app.finish();
        app.cleanup();
        for _ in 0..10 {
            app.update();
        }

        let scheduler = app.world().resource::<LoopScheduler>();
        assert_eq!(scheduler.phase(), LoopPhase::Idle);
        assert!(scheduler.store().is_empty());

        let buffer = app.world().resource::<EventBuffer>();
        assert_eq!(
            buffer.count(|e| matches!(e, GameEvent::ConfigError { .. })),
            1
        );
        assert_eq!(
            buffer.count(|e| matches!(e, GameEvent::LoopStart { .. })),
            0
        );
    }

    #[test]
    fn test_reset_input_restarts_the_run() {
        let mut app = HeadlessAppBuilder::new()
            .with_settings(short_run(3, ReconcileMode::Physics))
            .with_minimal_threads()
            .build();
        app.finish();
        app.cleanup();
        // Past the first loop boundary
        for _ in 0..100 {
            app.update();
        }
        assert_eq!(
            app.world().resource::<LoopScheduler>().state().loop_index,
            1
        );

        app.world_mut().resource_mut::<PlayerInput>().reset_pressed = true;
        app.update();

        let scheduler = app.world().resource::<LoopScheduler>();
        assert_eq!(scheduler.phase(), LoopPhase::Running);
        assert_eq!(scheduler.state().loop_index, 0);
        assert!(scheduler.store().is_empty());
        let buffer = app.world().resource::<EventBuffer>();
        assert_eq!(buffer.count(|e| matches!(e, GameEvent::RunReset)), 1);
    }
}
