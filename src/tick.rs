//! Fixed tick schedule shared by the windowed game and headless runs

use bevy::prelude::*;

use crate::constants::TICK_HZ;
use crate::events::{EventBus, update_event_bus_time};
use crate::ghost::{deactivate_fallen_ghosts, ghost_playback, report_ghost_impacts};
use crate::input::PlayerInput;
use crate::levels::LevelDatabase;
use crate::loops::{LoopScheduler, drive_loop_scheduler, process_loop_requests, return_fallen_player};
use crate::player::{
    apply_gravity, apply_input, carry_held_box, check_collisions, handle_pickup, move_player,
};
use crate::puzzle::{move_doors, update_pressure_plates, update_switch_groups};
use crate::recording::{ActionRecorder, record_player_actions};
use crate::settings::LoopSettings;
use crate::tuning::GameplayTuning;
use crate::world::{integrate_bodies, resolve_body_collisions};

/// Phases of one fixed tick, run in this order
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickSet {
    /// Reset/add-time input and queued loop starts
    Control,
    /// Live player movement and carrying
    Player,
    /// Sample the resolved player state
    Record,
    /// Ghost replay and dynamic bodies
    Ghosts,
    /// Plates, switch groups and doors
    World,
    /// Loop timer and boundaries
    Loop,
}

/// Insert the resources every run needs
pub fn insert_run_resources(
    app: &mut App,
    settings: LoopSettings,
    tuning: GameplayTuning,
    level_db: LevelDatabase,
) {
    let scheduler = LoopScheduler::new(settings.loop_config_or_default(), None);
    app.insert_resource(settings)
        .insert_resource(tuning)
        .insert_resource(level_db)
        .insert_resource(scheduler)
        .init_resource::<PlayerInput>()
        .init_resource::<ActionRecorder>();
    if !app.world().contains_resource::<EventBus>() {
        app.insert_resource(EventBus::new());
    }
}

/// Register the fixed tick systems
pub fn add_tick_systems(app: &mut App) {
    app.insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
        .configure_sets(
            FixedUpdate,
            (
                TickSet::Control,
                TickSet::Player,
                TickSet::Record,
                TickSet::Ghosts,
                TickSet::World,
                TickSet::Loop,
            )
                .chain(),
        )
        .add_systems(
            FixedUpdate,
            (
                (update_event_bus_time, process_loop_requests)
                    .chain()
                    .in_set(TickSet::Control),
                (
                    apply_input,
                    apply_gravity,
                    move_player,
                    check_collisions,
                    handle_pickup,
                    carry_held_box,
                    return_fallen_player,
                )
                    .chain()
                    .in_set(TickSet::Player),
                record_player_actions.in_set(TickSet::Record),
                (
                    ghost_playback,
                    integrate_bodies,
                    resolve_body_collisions,
                    report_ghost_impacts,
                    deactivate_fallen_ghosts,
                )
                    .chain()
                    .in_set(TickSet::Ghosts),
                (update_pressure_plates, update_switch_groups, move_doors)
                    .chain()
                    .in_set(TickSet::World),
                drive_loop_scheduler.in_set(TickSet::Loop),
            ),
        );
}
