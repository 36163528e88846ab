//! Loop systems - drive the scheduler from the fixed tick and carry out its directives

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::scheduler::{LoopDirective, LoopError, LoopPhase, LoopScheduler};
use crate::constants::ADD_TIME_STEP;
use crate::events::{EventBus, GameEvent};
use crate::ghost::{Ghost, spawn_ghost};
use crate::input::PlayerInput;
use crate::player::{
    Carrier, ControlEnabled, JumpPhase, Player, Velocity, release_box, teleport_player,
};
use crate::puzzle::{Door, PressurePlate};
use crate::recording::ActionRecorder;
use crate::settings::LoopSettings;
use crate::tuning::GameplayTuning;

/// World access needed to apply scheduler directives
#[derive(SystemParam)]
pub struct LoopEffects<'w, 's> {
    commands: Commands<'w, 's>,
    bus: ResMut<'w, EventBus>,
    settings: Res<'w, LoopSettings>,
    tuning: Res<'w, GameplayTuning>,
    players: Query<
        'w,
        's,
        (
            &'static mut Transform,
            &'static mut Velocity,
            &'static mut JumpPhase,
            &'static mut ControlEnabled,
            &'static mut Carrier,
        ),
        With<Player>,
    >,
    ghosts: Query<'w, 's, Entity, With<Ghost>>,
    plates: Query<'w, 's, &'static mut PressurePlate>,
    doors: Query<'w, 's, &'static mut Door>,
}

impl LoopEffects<'_, '_> {
    /// Apply directives in the order the scheduler pushed them
    pub fn execute(&mut self, directives: Vec<LoopDirective>) {
        for directive in directives {
            match directive {
                LoopDirective::DespawnGhosts => {
                    for entity in &self.ghosts {
                        self.commands.entity(entity).despawn();
                    }
                }
                LoopDirective::TeleportPlayer(position) => {
                    for (mut transform, mut velocity, mut phase, _, mut carrier) in
                        &mut self.players
                    {
                        release_box(&mut self.commands, &mut carrier);
                        teleport_player(&mut transform, &mut velocity, &mut phase, position);
                    }
                }
                LoopDirective::SetPlayerControl(enabled) => {
                    for (_, _, _, mut control, _) in &mut self.players {
                        control.0 = enabled;
                    }
                }
                LoopDirective::SpawnGhost(spawn) => {
                    spawn_ghost(
                        &mut self.commands,
                        &spawn,
                        self.settings.ghost_mode,
                        &self.tuning,
                    );
                }
                LoopDirective::LoopStarted { loop_index, ghosts } => {
                    self.bus.emit(GameEvent::LoopStart { loop_index, ghosts });
                }
                LoopDirective::LoopEnded {
                    loop_index,
                    samples,
                } => {
                    self.bus.emit(GameEvent::LoopEnd {
                        loop_index,
                        samples,
                    });
                }
                LoopDirective::GameOver { loops } => {
                    self.bus.emit(GameEvent::GameOver { loops });
                }
                LoopDirective::RunReset => {
                    for mut plate in &mut self.plates {
                        plate.reset();
                    }
                    for mut door in &mut self.doors {
                        door.reset();
                    }
                    self.bus.emit(GameEvent::RunReset);
                }
            }
        }
    }

    /// Log a refused transition and put it on the bus
    pub fn report_error(&mut self, error: &LoopError) {
        error!("{}", error);
        self.bus.emit(GameEvent::ConfigError {
            message: error.to_string(),
        });
    }
}

/// Top of the tick: reset/add-time input and queued start/reset requests
pub fn process_loop_requests(
    time: Res<Time>,
    mut input: ResMut<PlayerInput>,
    mut scheduler: ResMut<LoopScheduler>,
    mut recorder: ResMut<ActionRecorder>,
    mut effects: LoopEffects,
) {
    if input.reset_pressed {
        input.reset_pressed = false;
        scheduler.request_reset();
    }
    if input.add_time_pressed {
        input.add_time_pressed = false;
        if scheduler.phase() == LoopPhase::Running {
            scheduler.add_time(ADD_TIME_STEP);
            effects.bus.emit(GameEvent::AddTime {
                seconds: ADD_TIME_STEP,
            });
        }
    }

    if !scheduler.has_pending_request() {
        return;
    }
    let mut directives = Vec::new();
    let result = scheduler.process_requests(time.elapsed_secs(), &mut recorder, &mut directives);
    effects.execute(directives);
    if let Err(error) = result {
        effects.report_error(&error);
    }
}

/// End of the tick: end loops whose time is up and start the next one
pub fn drive_loop_scheduler(
    time: Res<Time>,
    mut scheduler: ResMut<LoopScheduler>,
    mut recorder: ResMut<ActionRecorder>,
    mut effects: LoopEffects,
) {
    let mut directives = Vec::new();
    let result = scheduler.tick(time.elapsed_secs(), &mut recorder, &mut directives);
    effects.execute(directives);
    if let Err(error) = result {
        effects.report_error(&error);
    }
}

/// Put a player who fell out of the world back on the spawn point
pub fn return_fallen_player(
    mut commands: Commands,
    tuning: Res<GameplayTuning>,
    scheduler: Res<LoopScheduler>,
    mut players: Query<
        (&mut Transform, &mut Velocity, &mut JumpPhase, &mut Carrier),
        With<Player>,
    >,
) {
    let Some(spawn_point) = scheduler.spawn_point() else {
        return;
    };
    for (mut transform, mut velocity, mut phase, mut carrier) in &mut players {
        if transform.translation.y >= tuning.fall_limit_y {
            continue;
        }
        debug!("Player fell out of the world, returning to spawn");
        release_box(&mut commands, &mut carrier);
        teleport_player(&mut transform, &mut velocity, &mut phase, spawn_point);
    }
}
