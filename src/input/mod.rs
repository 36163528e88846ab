//! Input module - PlayerInput resource and capture_input system

use bevy::prelude::*;

use crate::constants::*;

/// Buffered input state for the live player.
///
/// Presses are captured every frame in Update and held here until a fixed tick
/// consumes them, so a press between ticks is never lost.
#[derive(Resource, Default, Debug, Clone)]
pub struct PlayerInput {
    pub move_x: f32,
    pub jump_buffer_timer: f32, // Time remaining in jump buffer
    pub jump_held: bool,        // Is jump button currently held
    pub jump_released: bool,    // Jump let go since last tick
    pub pickup_pressed: bool,   // E / West - pick up or drop a box
    pub reset_pressed: bool,    // R / Start - restart the run
    pub add_time_pressed: bool, // T / North - extend the current loop
}

impl PlayerInput {
    /// Clear one-shot presses after a tick used them
    pub fn consume_presses(&mut self) {
        self.jump_released = false;
        self.pickup_pressed = false;
    }
}

/// Runs in Update to capture input state before it's cleared.
pub fn capture_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    gamepads: Query<&Gamepad>,
    mut input: ResMut<PlayerInput>,
    time: Res<Time>,
) {
    // Horizontal movement (continuous - overwrite each frame)
    let mut move_x = 0.0;

    if keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft) {
        move_x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight) {
        move_x += 1.0;
    }

    for gamepad in &gamepads {
        if let Some(stick_x) = gamepad.get(GamepadAxis::LeftStickX) {
            if stick_x.abs() > STICK_DEADZONE {
                move_x += stick_x;
            }
        }
    }

    input.move_x = move_x.clamp(-1.0, 1.0);

    let jump_pressed = keyboard.just_pressed(KeyCode::Space)
        || keyboard.just_pressed(KeyCode::KeyW)
        || keyboard.just_pressed(KeyCode::ArrowUp)
        || gamepads
            .iter()
            .any(|gp| gp.just_pressed(GamepadButton::South));

    let jump_held_now = keyboard.pressed(KeyCode::Space)
        || keyboard.pressed(KeyCode::KeyW)
        || keyboard.pressed(KeyCode::ArrowUp)
        || gamepads.iter().any(|gp| gp.pressed(GamepadButton::South));

    // Accumulate the release until a tick consumes it
    if input.jump_held && !jump_held_now {
        input.jump_released = true;
    }
    input.jump_held = jump_held_now;

    // Jump buffering - reset timer on press, count down otherwise
    if jump_pressed {
        input.jump_buffer_timer = JUMP_BUFFER_TIME;
    } else {
        input.jump_buffer_timer = (input.jump_buffer_timer - time.delta_secs()).max(0.0);
    }

    if keyboard.just_pressed(KeyCode::KeyE)
        || gamepads
            .iter()
            .any(|gp| gp.just_pressed(GamepadButton::West))
    {
        input.pickup_pressed = true;
    }

    if keyboard.just_pressed(KeyCode::KeyR)
        || gamepads
            .iter()
            .any(|gp| gp.just_pressed(GamepadButton::Start))
    {
        input.reset_pressed = true;
    }

    if keyboard.just_pressed(KeyCode::KeyT)
        || gamepads
            .iter()
            .any(|gp| gp.just_pressed(GamepadButton::North))
    {
        input.add_time_pressed = true;
    }
}
