//! HUD components and systems (loop counter, timer, banner)

use bevy::prelude::*;

use crate::constants::*;
use crate::events::{EventBus, GameEvent};
use crate::loops::{LoopPhase, LoopScheduler, LoopStatus};
use crate::settings::LoopSettings;

/// "Loop: i/max" text
#[derive(Component)]
pub struct LoopText;

/// Remaining loop time text
#[derive(Component)]
pub struct TimeText;

/// Centered game over / restart / error message
#[derive(Component)]
pub struct BannerText;

/// Last configuration error, shown until a loop starts
#[derive(Resource, Default, Debug)]
pub struct HudMessages {
    pub error: Option<String>,
}

/// Spawn the screen-space HUD
pub fn spawn_hud(commands: &mut Commands) {
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            left: Val::Px(12.0),
            top: Val::Px(10.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(4.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("Loop: -"),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(TEXT_PRIMARY),
                LoopText,
            ));
            parent.spawn((
                Text::new("Time: -"),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(TEXT_PRIMARY),
                TimeText,
            ));
        });

    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            top: Val::Percent(35.0),
            justify_content: JustifyContent::Center,
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: 40.0,
                    ..default()
                },
                TextLayout::new_with_justify(Justify::Center),
                TextColor(TEXT_ACCENT),
                Visibility::Hidden,
                BannerText,
            ));
        });
}

/// Loop counter line
pub fn loop_label(status: &LoopStatus) -> String {
    format!("Loop: {}/{}", status.loop_index + 1, status.max_loops)
}

/// Timer line
pub fn time_label(status: &LoopStatus) -> String {
    format!("Time: {:.1}", status.time_remaining)
}

/// Banner for the current state, if any
pub fn banner_label(
    status: &LoopStatus,
    game_over_at: Option<f32>,
    now: f32,
    game_over_delay: f32,
    error: Option<&str>,
) -> Option<String> {
    match status.phase {
        LoopPhase::GameOver => {
            let shown_for = game_over_at.map(|at| now - at).unwrap_or(f32::MAX);
            if shown_for < game_over_delay {
                Some("GAME OVER".to_string())
            } else {
                Some("Press R to restart".to_string())
            }
        }
        LoopPhase::Idle => error.map(str::to_string),
        _ => None,
    }
}

/// Remember configuration errors raised this frame
pub fn collect_hud_messages(bus: Res<EventBus>, mut messages: ResMut<HudMessages>) {
    for event in bus.peek() {
        match &event.event {
            GameEvent::ConfigError { message } => messages.error = Some(message.clone()),
            GameEvent::LoopStart { .. } => messages.error = None,
            _ => {}
        }
    }
}

/// Update loop counter, timer and banner
pub fn update_hud(
    time: Res<Time<Fixed>>,
    settings: Res<LoopSettings>,
    scheduler: Res<LoopScheduler>,
    messages: Res<HudMessages>,
    mut loop_text: Query<&mut Text, (With<LoopText>, Without<TimeText>, Without<BannerText>)>,
    mut time_text: Query<&mut Text, (With<TimeText>, Without<LoopText>, Without<BannerText>)>,
    mut banner: Query<(&mut Text, &mut Visibility), (With<BannerText>, Without<LoopText>, Without<TimeText>)>,
) {
    let now = time.elapsed_secs();
    let status = scheduler.status(now);

    if let Ok(mut text) = loop_text.single_mut() {
        text.0 = loop_label(&status);
    }
    if let Ok(mut text) = time_text.single_mut() {
        text.0 = time_label(&status);
    }

    let Ok((mut text, mut visibility)) = banner.single_mut() else {
        return;
    };
    match banner_label(
        &status,
        scheduler.game_over_at(),
        now,
        settings.game_over_delay,
        messages.error.as_deref(),
    ) {
        Some(label) => {
            if text.0 != label {
                text.0 = label;
            }
            visibility.set_if_neq(Visibility::Inherited);
        }
        None => {
            visibility.set_if_neq(Visibility::Hidden);
        }
    }
}
