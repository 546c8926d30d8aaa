//! Global run state and the ordered system sets every gameplay system slots into. Pausing only
//! flips an enum; all per-frame timers live in components ticked by `Playing`-gated systems, so
//! they freeze with the game for free.

use bevy::input::keyboard::KeyCode;
use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum GameState {
    #[default]
    Playing,
    Paused,
}

/// Named system sets to structure the Update schedule.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameSet {
    /// Keyboard/pointer to intent.
    Input,
    /// Intent to velocity (player controller, enemy patrol).
    Movement,
    /// Velocity to position, blocked flags.
    Physics,
    /// Overlaps: stomps, side hits, pickups, doors.
    Interactions,
    /// Visual feedback derived from the frame's outcome.
    Effects,
}

/// Toggles between Playing and Paused when `ESC` is pressed.
pub fn toggle_pause(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !keyboard.just_pressed(KeyCode::Escape) {
        return;
    }

    match state.get() {
        GameState::Playing => {
            info!("Paused");
            next_state.set(GameState::Paused);
        }
        GameState::Paused => {
            info!("Resumed");
            next_state.set(GameState::Playing);
        }
    }
}
