//! High-level plugin composition.
//!
//! `MoonTripPlugin` registers every gameplay plugin and fixes the frame order:
//! gameplay input, then scene bookkeeping, then movement, physics, interactions and effects.

use bevy::prelude::*;

use crate::audio::GameAudioPlugin;
use crate::camera::{CameraPlugin, FollowCamera};
use crate::enemy::EnemyPlugin;
use crate::fx::FxPlugin;
use crate::level::LevelPlugin;
use crate::physics::PhysicsPlugin;
use crate::pickup::PickupPlugin;
use crate::player::PlayerPlugin;
use crate::scene::{ScenePlugin, SceneSet};
use crate::sprites::SpriteArtPlugin;
use crate::state::{toggle_pause, GameSet, GameState};
use crate::title::TitlePlugin;
use crate::ui::UiPlugin;

pub struct MoonTripPlugin;

impl Plugin for MoonTripPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .add_plugins((
                SpriteArtPlugin,
                GameAudioPlugin,
                ScenePlugin,
                TitlePlugin,
                LevelPlugin,
                PlayerPlugin,
                EnemyPlugin,
                PickupPlugin,
                PhysicsPlugin,
                FxPlugin,
                CameraPlugin,
                UiPlugin,
            ))
            // Gameplay sets only run while Playing; scene sets always run so a restart works
            // from the pause screen too.
            .configure_sets(
                Update,
                (
                    GameSet::Input,
                    GameSet::Movement,
                    GameSet::Physics,
                    GameSet::Interactions,
                    GameSet::Effects,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .configure_sets(
                Update,
                (SceneSet::Flow, SceneSet::Build, SceneSet::Signals)
                    .chain()
                    .after(GameSet::Input)
                    .before(GameSet::Movement),
            )
            .add_systems(Startup, setup_camera)
            .add_systems(Update, toggle_pause);
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("MainCamera"),
        Camera2dBundle::default(),
        FollowCamera,
    ));
}
